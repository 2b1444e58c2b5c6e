//! # 절차 데이터베이스 쿼리 모듈
//!
//! `procedures` 테이블과 절차-문서 다대다 연결 테이블(`procedure_documents`)을 다룹니다.
//! 상태는 항상 `ProcedureStatus::as_str()`의 표준 라벨로 저장합니다.

use super::NOW;
use crate::error::AppError;
use crate::models::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const PROCEDURE_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.subprocess_id, s.department_id,
           p.responsible_id, u.name AS responsible_name, p.status,
           p.created_by, p.modified_by, p.last_modified
    FROM procedures p
    JOIN subprocesses s ON s.id = p.subprocess_id
    LEFT JOIN users u ON u.id = p.responsible_id
"#;

pub async fn list_procedures(pool: &SqlitePool) -> Result<Vec<Procedure>, AppError> {
    let procedures = sqlx::query_as::<_, Procedure>(&format!("{PROCEDURE_SELECT} ORDER BY p.id"))
        .fetch_all(pool)
        .await?;
    Ok(procedures)
}

pub async fn get_procedure(pool: &SqlitePool, id: i64) -> Result<Option<Procedure>, AppError> {
    let procedure = sqlx::query_as::<_, Procedure>(&format!("{PROCEDURE_SELECT} WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(procedure)
}

pub async fn list_procedures_by_subprocess(
    pool: &SqlitePool,
    subprocess_id: i64,
) -> Result<Vec<Procedure>, AppError> {
    let procedures = sqlx::query_as::<_, Procedure>(&format!(
        "{PROCEDURE_SELECT} WHERE p.subprocess_id = ? ORDER BY p.id"
    ))
    .bind(subprocess_id)
    .fetch_all(pool)
    .await?;
    Ok(procedures)
}

pub async fn list_procedures_by_department(
    pool: &SqlitePool,
    department_id: i64,
) -> Result<Vec<Procedure>, AppError> {
    let procedures = sqlx::query_as::<_, Procedure>(&format!(
        "{PROCEDURE_SELECT} WHERE s.department_id = ? ORDER BY p.id"
    ))
    .bind(department_id)
    .fetch_all(pool)
    .await?;
    Ok(procedures)
}

/// 사용자가 담당자, 작성자, 마지막 수정자 중 하나인 절차들
pub async fn list_procedures_by_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Procedure>, AppError> {
    let procedures = sqlx::query_as::<_, Procedure>(&format!(
        "{PROCEDURE_SELECT} WHERE p.responsible_id = ? OR p.created_by = ? OR p.modified_by = ? ORDER BY p.id"
    ))
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(procedures)
}

pub async fn create_procedure(
    pool: &SqlitePool,
    req: &CreateProcedureRequest,
    status: ProcedureStatus,
    caller_id: i64,
) -> Result<Procedure, AppError> {
    let mut conn = pool.acquire().await?;
    if !super::subprocess_exists(&mut conn, req.subprocess_id).await? {
        return Err(AppError::NotFound);
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO procedures (title, description, subprocess_id, responsible_id, status, created_by)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.title.trim())
    .bind(&req.description)
    .bind(req.subprocess_id)
    .bind(caller_id)
    .bind(status.as_str())
    .bind(caller_id)
    .fetch_one(&mut *conn)
    .await?;
    drop(conn);

    get_procedure(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created procedure".to_string()))
}

/// 절차를 부분 수정합니다. 수정자와 수정 시각은 항상 갱신됩니다.
///
/// `status`는 라우트에서 이미 파싱된 값입니다. None이면 기존 상태를 유지합니다.
pub async fn update_procedure(
    pool: &SqlitePool,
    id: i64,
    req: &UpdateProcedureRequest,
    status: Option<ProcedureStatus>,
    caller_id: i64,
) -> Result<Option<Procedure>, AppError> {
    if get_procedure(pool, id).await?.is_none() {
        return Ok(None);
    }

    if let Some(subprocess_id) = req.subprocess_id {
        let mut conn = pool.acquire().await?;
        if !super::subprocess_exists(&mut conn, subprocess_id).await? {
            return Err(AppError::NotFound);
        }
    }

    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("UPDATE procedures SET last_modified = {NOW}, modified_by = "));
    query.push_bind(caller_id);
    if let Some(title) = &req.title {
        query.push(", title = ").push_bind(title.trim().to_string());
    }
    if let Some(description) = &req.description {
        query.push(", description = ").push_bind(description.clone());
    }
    if let Some(subprocess_id) = req.subprocess_id {
        query.push(", subprocess_id = ").push_bind(subprocess_id);
    }
    if let Some(status) = status {
        query.push(", status = ").push_bind(status.as_str());
    }
    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(pool).await?;

    get_procedure(pool, id).await
}

pub async fn procedure_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM procedures WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// 절차에 문서를 연결합니다. 이미 연결되어 있으면 아무 것도 하지 않고 false를 반환합니다.
pub async fn attach_document(
    conn: &mut SqliteConnection,
    procedure_id: i64,
    document_id: i64,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO procedure_documents (procedure_id, document_id) VALUES (?, ?)",
    )
    .bind(procedure_id)
    .bind(document_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn detach_document(
    pool: &SqlitePool,
    procedure_id: i64,
    document_id: i64,
) -> Result<bool, AppError> {
    let result =
        sqlx::query("DELETE FROM procedure_documents WHERE procedure_id = ? AND document_id = ?")
            .bind(procedure_id)
            .bind(document_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_procedure_documents(
    pool: &SqlitePool,
    procedure_id: i64,
) -> Result<Vec<ProcedureDocument>, AppError> {
    let documents = sqlx::query_as::<_, ProcedureDocument>(
        r#"
        SELECT d.id AS document_id, d.name, d.description, pd.added_at,
               (SELECT MAX(v.version_number) FROM document_versions v WHERE v.document_id = d.id)
                   AS latest_version
        FROM procedure_documents pd
        JOIN documents d ON d.id = pd.document_id
        WHERE pd.procedure_id = ?
        ORDER BY pd.added_at, d.id
        "#,
    )
    .bind(procedure_id)
    .fetch_all(pool)
    .await?;
    Ok(documents)
}

pub async fn delete_procedure_links(
    conn: &mut SqliteConnection,
    procedure_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM procedure_documents WHERE procedure_id = ?")
        .bind(procedure_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_procedure_row(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM procedures WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// 부서 아래 모든 하위 프로세스에 속한 절차들의 문서 연결 행을 삭제합니다.
pub async fn delete_procedure_links_for_department(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM procedure_documents
        WHERE procedure_id IN (
            SELECT p.id FROM procedures p
            JOIN subprocesses s ON s.id = p.subprocess_id
            WHERE s.department_id = ?
        )
        "#,
    )
    .bind(department_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// subprocess_id가 부서의 하위 프로세스 집합에 속하는 절차를 모두 삭제합니다.
pub async fn delete_procedures_for_department(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query(
        r#"
        DELETE FROM procedures
        WHERE subprocess_id IN (SELECT id FROM subprocesses WHERE department_id = ?)
        "#,
    )
    .bind(department_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
