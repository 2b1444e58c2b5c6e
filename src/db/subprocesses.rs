use crate::error::AppError;
use crate::models::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const SUBPROCESS_SELECT: &str = r#"
    SELECT s.id, s.name, s.description, s.department_id, d.name AS department_name,
           (SELECT COUNT(*) FROM procedures p WHERE p.subprocess_id = s.id) AS procedure_count
    FROM subprocesses s
    JOIN departments d ON d.id = s.department_id
"#;

pub async fn list_subprocesses(
    pool: &SqlitePool,
    department_id: Option<i64>,
) -> Result<Vec<Subprocess>, AppError> {
    let subprocesses = match department_id {
        Some(department_id) => {
            sqlx::query_as::<_, Subprocess>(&format!(
                "{SUBPROCESS_SELECT} WHERE s.department_id = ? ORDER BY s.name"
            ))
            .bind(department_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Subprocess>(&format!("{SUBPROCESS_SELECT} ORDER BY s.name"))
                .fetch_all(pool)
                .await?
        }
    };

    Ok(subprocesses)
}

pub async fn get_subprocess(pool: &SqlitePool, id: i64) -> Result<Option<Subprocess>, AppError> {
    let subprocess = sqlx::query_as::<_, Subprocess>(&format!("{SUBPROCESS_SELECT} WHERE s.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(subprocess)
}

/// 하위 프로세스를 생성합니다. 부서가 없으면 NotFound.
pub async fn create_subprocess(
    pool: &SqlitePool,
    req: &CreateSubprocessRequest,
) -> Result<Subprocess, AppError> {
    let mut conn = pool.acquire().await?;
    if !super::department_exists(&mut conn, req.department_id).await? {
        return Err(AppError::NotFound);
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO subprocesses (name, description, department_id)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .bind(req.department_id)
    .fetch_one(&mut *conn)
    .await?;
    drop(conn);

    get_subprocess(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created subprocess".to_string()))
}

pub async fn update_subprocess(
    pool: &SqlitePool,
    id: i64,
    req: &UpdateSubprocessRequest,
) -> Result<Option<Subprocess>, AppError> {
    if get_subprocess(pool, id).await?.is_none() {
        return Ok(None);
    }

    if let Some(department_id) = req.department_id {
        let mut conn = pool.acquire().await?;
        if !super::department_exists(&mut conn, department_id).await? {
            return Err(AppError::NotFound);
        }
    }

    if req.name.is_some() || req.description.is_some() || req.department_id.is_some() {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE subprocesses SET ");
        let mut fields = query.separated(", ");
        if let Some(name) = &req.name {
            fields.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(description) = &req.description {
            fields.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(department_id) = req.department_id {
            fields.push("department_id = ").push_bind_unseparated(department_id);
        }
        query.push(" WHERE id = ").push_bind(id);
        query.build().execute(pool).await?;
    }

    get_subprocess(pool, id).await
}

pub async fn subprocess_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM subprocesses WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// 하위 프로세스를 참조하는 절차 수
pub async fn count_procedures_in_subprocess(
    conn: &mut SqliteConnection,
    subprocess_id: i64,
) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM procedures WHERE subprocess_id = ?")
        .bind(subprocess_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn subprocess_ids_for_department(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<Vec<i64>, AppError> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM subprocesses WHERE department_id = ? ORDER BY id")
            .bind(department_id)
            .fetch_all(conn)
            .await?;
    Ok(ids)
}

pub async fn delete_subprocess_row(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM subprocesses WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_subprocesses_for_department(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM subprocesses WHERE department_id = ?")
        .bind(department_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
