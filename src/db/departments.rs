//! # 부서 데이터베이스 쿼리 모듈
//!
//! 부서 조회/통계 쿼리와, 부서 생성·수정·삭제 트랜잭션을 이루는 단계 함수들입니다.
//! 여러 테이블에 걸친 순서와 트랜잭션 경계는 `services::cascade`가 정합니다.

use super::NOW;
use crate::error::AppError;
use crate::models::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const DEPARTMENT_SELECT: &str = r#"
    SELECT d.id, d.name, d.description, d.head_id, u.name AS head_name,
           d.secretariat_id, d.is_active, d.last_modified
    FROM departments d
    LEFT JOIN users u ON u.id = d.head_id
"#;

/// 모든 부서를 구성원/하위 프로세스/절차 수와 함께 조회합니다.
pub async fn list_departments(pool: &SqlitePool) -> Result<Vec<DepartmentSummary>, AppError> {
    let departments = sqlx::query_as::<_, DepartmentSummary>(
        r#"
        SELECT d.id, d.name, d.description, d.head_id, u.name AS head_name,
               d.secretariat_id, d.is_active, d.last_modified,
               (SELECT COUNT(*) FROM users m WHERE m.department_id = d.id) AS member_count,
               (SELECT COUNT(*) FROM subprocesses s WHERE s.department_id = d.id) AS subprocess_count,
               (SELECT COUNT(*) FROM procedures p
                JOIN subprocesses s ON s.id = p.subprocess_id
                WHERE s.department_id = d.id) AS procedure_count
        FROM departments d
        LEFT JOIN users u ON u.id = d.head_id
        ORDER BY d.name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(departments)
}

pub async fn get_department(pool: &SqlitePool, id: i64) -> Result<Option<Department>, AppError> {
    let department = sqlx::query_as::<_, Department>(&format!("{DEPARTMENT_SELECT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(department)
}

pub async fn department_stats(pool: &SqlitePool) -> Result<DepartmentStats, AppError> {
    let stats = sqlx::query_as::<_, DepartmentStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM departments) AS total_departments,
            (SELECT COUNT(*) FROM departments WHERE is_active = 1) AS active_departments,
            (SELECT COUNT(*) FROM departments WHERE head_id IS NOT NULL) AS total_heads,
            (SELECT COUNT(*) FROM procedures p
             JOIN subprocesses s ON s.id = p.subprocess_id) AS total_procedures
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(stats)
}

pub async fn department_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_department(
    conn: &mut SqliteConnection,
    req: &CreateDepartmentRequest,
) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO departments (name, description, head_id, secretariat_id)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.head_id)
    .bind(req.secretariat_id)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// 요청에 들어 있는 필드만 수정하고 `last_modified`를 갱신합니다.
pub async fn update_department_row(
    conn: &mut SqliteConnection,
    id: i64,
    req: &UpdateDepartmentRequest,
) -> Result<(), AppError> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("UPDATE departments SET last_modified = {NOW}"));
    if let Some(name) = &req.name {
        query.push(", name = ").push_bind(name.trim().to_string());
    }
    if let Some(description) = &req.description {
        query.push(", description = ").push_bind(description.clone());
    }
    if let Some(head_id) = req.head_id {
        query.push(", head_id = ").push_bind(head_id);
    }
    if let Some(secretariat_id) = req.secretariat_id {
        query.push(", secretariat_id = ").push_bind(secretariat_id);
    }
    if let Some(is_active) = req.is_active {
        query.push(", is_active = ").push_bind(is_active);
    }
    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(conn).await?;

    Ok(())
}

/// 부서의 부서장 참조를 끊습니다.
pub async fn clear_department_head(conn: &mut SqliteConnection, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE departments SET head_id = NULL WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_department_row(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
