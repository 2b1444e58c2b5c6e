//! # 연쇄 정합성(Cascading Consistency) 관리
//!
//! 부서/하위 프로세스/절차를 삭제하거나 부서장을 바꿀 때 여러 테이블을 함께 고칩니다.
//! 모든 작업은 트랜잭션 하나로 실행되고, 결과는 세 가지 중 하나입니다.
//!
//! - `Committed`: 모든 단계가 함께 반영됨
//! - `RolledBackConflict`: 선행 조건(존재 여부, 하위 의존성)에 막혀 아무 것도 바뀌지 않음
//! - `RolledBackError`: 예기치 않은 저장소 오류로 전부 롤백됨
//!
//! `sqlx::Transaction`은 commit 없이 drop되면 롤백되므로, 단계 중 어디서든 `?`로 빠져나가면
//! 그 전 단계들도 반영되지 않습니다.

use crate::{db, error::AppError, models::*};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeOutcome {
    Committed,
    RolledBackConflict,
    RolledBackError,
}

impl CascadeOutcome {
    pub fn of<T>(result: &Result<T, AppError>) -> Self {
        match result {
            Ok(_) => CascadeOutcome::Committed,
            Err(
                AppError::NotFound
                | AppError::HasDependents(_)
                | AppError::InvalidArgument(_)
                | AppError::Conflict(_),
            ) => CascadeOutcome::RolledBackConflict,
            Err(_) => CascadeOutcome::RolledBackError,
        }
    }
}

/// 작업 결과를 로그로 남기고 그대로 돌려줍니다.
fn record<T>(operation: &'static str, id: i64, result: Result<T, AppError>) -> Result<T, AppError> {
    match CascadeOutcome::of(&result) {
        CascadeOutcome::Committed => {
            tracing::info!(operation, id, outcome = "Committed", "cascade finished")
        }
        CascadeOutcome::RolledBackConflict => {
            if let Err(err) = &result {
                tracing::warn!(operation, id, outcome = "RolledBackConflict", error = %err, "cascade rejected");
            }
        }
        CascadeOutcome::RolledBackError => {
            if let Err(err) = &result {
                tracing::error!(operation, id, outcome = "RolledBackError", error = %err, "cascade rolled back");
            }
        }
    }
    result
}

/// 부서 삭제 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentDeletion {
    pub subprocess_ids: Vec<i64>,
    pub subprocesses_deleted: u64,
    pub procedures_deleted: u64,
    pub procedure_links_deleted: u64,
    pub users_detached: u64,
}

/// 부서와 그 아래 모든 것을 하나의 트랜잭션으로 삭제합니다.
///
/// 1. 부서 존재 확인 (없으면 NotFound)
/// 2. 하위 프로세스 ID 수집
/// 3. 그 하위 프로세스들에 속한 절차의 문서 연결 행과 절차 삭제
/// 4. 하위 프로세스 삭제
/// 5. 구성원의 department_id를 NULL로 분리
/// 6. 부서 자신의 head_id 해제
/// 7. 부서 행 삭제
pub async fn delete_department(
    pool: &SqlitePool,
    department_id: i64,
) -> Result<DepartmentDeletion, AppError> {
    let result = delete_department_tx(pool, department_id).await;
    record("delete_department", department_id, result)
}

async fn delete_department_tx(
    pool: &SqlitePool,
    department_id: i64,
) -> Result<DepartmentDeletion, AppError> {
    let mut tx = pool.begin().await?;

    if !db::department_exists(&mut tx, department_id).await? {
        return Err(AppError::NotFound);
    }

    let subprocess_ids = db::subprocess_ids_for_department(&mut tx, department_id).await?;
    let procedure_links_deleted =
        db::delete_procedure_links_for_department(&mut tx, department_id).await?;
    let procedures_deleted = db::delete_procedures_for_department(&mut tx, department_id).await?;
    let subprocesses_deleted = db::delete_subprocesses_for_department(&mut tx, department_id).await?;
    let users_detached = db::detach_department_members(&mut tx, department_id).await?;
    db::clear_department_head(&mut tx, department_id).await?;
    db::delete_department_row(&mut tx, department_id).await?;

    tx.commit().await?;

    Ok(DepartmentDeletion {
        subprocess_ids,
        subprocesses_deleted,
        procedures_deleted,
        procedure_links_deleted,
        users_detached,
    })
}

/// 하위 프로세스를 삭제합니다. 절차가 하나라도 참조하면 아무 것도 바꾸지 않고 `HasDependents`.
pub async fn delete_subprocess(pool: &SqlitePool, subprocess_id: i64) -> Result<(), AppError> {
    let result = delete_subprocess_tx(pool, subprocess_id).await;
    record("delete_subprocess", subprocess_id, result)
}

async fn delete_subprocess_tx(pool: &SqlitePool, subprocess_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    if !db::subprocess_exists(&mut tx, subprocess_id).await? {
        return Err(AppError::NotFound);
    }

    let procedures = db::count_procedures_in_subprocess(&mut tx, subprocess_id).await?;
    if procedures > 0 {
        return Err(AppError::HasDependents(format!(
            "Subprocess {} still has {} associated procedure(s)",
            subprocess_id, procedures
        )));
    }

    db::delete_subprocess_row(&mut tx, subprocess_id).await?;
    tx.commit().await?;
    Ok(())
}

/// 절차의 문서 연결 행과 절차 행을 함께 삭제하고, 지운 연결 수를 반환합니다.
pub async fn delete_procedure(pool: &SqlitePool, procedure_id: i64) -> Result<u64, AppError> {
    let result = delete_procedure_tx(pool, procedure_id).await;
    record("delete_procedure", procedure_id, result)
}

async fn delete_procedure_tx(pool: &SqlitePool, procedure_id: i64) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    if !db::procedure_exists(&mut tx, procedure_id).await? {
        return Err(AppError::NotFound);
    }

    let links = db::delete_procedure_links(&mut tx, procedure_id).await?;
    db::delete_procedure_row(&mut tx, procedure_id).await?;

    tx.commit().await?;
    Ok(links)
}

/// 절차에 문서를 연결합니다. 둘 다 존재해야 하며, 이미 연결되어 있으면 false.
pub async fn attach_document(
    pool: &SqlitePool,
    procedure_id: i64,
    document_id: i64,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    if !db::procedure_exists(&mut tx, procedure_id).await?
        || !db::document_exists(&mut tx, document_id).await?
    {
        return Err(AppError::NotFound);
    }

    let added = db::attach_document(&mut tx, procedure_id, document_id).await?;
    tx.commit().await?;

    tracing::debug!(procedure_id, document_id, added, "attached document to procedure");
    Ok(added)
}

/// 부서를 생성하고, 부서장이 지정되면 그 사용자를 부서 구성원으로 옮깁니다.
pub async fn create_department(
    pool: &SqlitePool,
    req: &CreateDepartmentRequest,
) -> Result<Department, AppError> {
    let mut tx = pool.begin().await?;

    if let Some(head_id) = req.head_id {
        if !db::user_exists(&mut tx, head_id).await? {
            return Err(AppError::NotFound);
        }
    }

    let id = db::insert_department(&mut tx, req).await?;
    if let Some(head_id) = req.head_id {
        db::move_user_to_department(&mut tx, head_id, id).await?;
    }

    tx.commit().await?;
    tracing::info!(department_id = id, head_id = ?req.head_id, "created department");

    db::get_department(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created department".to_string()))
}

/// 부서를 부분 수정합니다. 새 부서장이 지정되면 같은 트랜잭션에서 그 사용자의 소속도 바꿉니다.
pub async fn update_department(
    pool: &SqlitePool,
    department_id: i64,
    req: &UpdateDepartmentRequest,
) -> Result<Department, AppError> {
    let mut tx = pool.begin().await?;

    if !db::department_exists(&mut tx, department_id).await? {
        return Err(AppError::NotFound);
    }

    let new_head = req.head_id.flatten();
    if let Some(head_id) = new_head {
        if !db::user_exists(&mut tx, head_id).await? {
            return Err(AppError::NotFound);
        }
    }

    db::update_department_row(&mut tx, department_id, req).await?;
    if let Some(head_id) = new_head {
        db::move_user_to_department(&mut tx, head_id, department_id).await?;
    }

    tx.commit().await?;
    tracing::info!(department_id, head_id = ?new_head, "updated department");

    db::get_department(pool, department_id)
        .await?
        .ok_or(AppError::NotFound)
}
