use crate::error::AppError;
use crate::models::user::*;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn create_user(pool: &SqlitePool, req: &CreateUserRequest) -> Result<User, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, role, department_id)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(req.role.as_deref().unwrap_or("user"))
    .bind(req.department_id)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, department_id, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn list_department_members(
    pool: &SqlitePool,
    department_id: i64,
) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, email, role, department_id, created_at
        FROM users
        WHERE department_id = ?
        ORDER BY name
        "#,
    )
    .bind(department_id)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn user_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// 부서장으로 지정된 사용자를 그 부서의 구성원으로 옮깁니다.
pub async fn move_user_to_department(
    conn: &mut SqliteConnection,
    user_id: i64,
    department_id: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET department_id = ? WHERE id = ?")
        .bind(department_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// 부서를 가리키는 모든 사용자의 소속을 NULL로 분리하고, 분리된 수를 반환합니다.
pub async fn detach_department_members(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("UPDATE users SET department_id = NULL WHERE department_id = ?")
        .bind(department_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
