//! # 문서 데이터베이스 쿼리 모듈
//!
//! `documents` 테이블의 메타데이터 CRUD와, 문서 삭제 트랜잭션을 이루는 단계 함수들입니다.
//! 문서 자체는 파일 바이트를 갖지 않습니다. 바이트는 `versions` 모듈이 다룹니다.

use crate::error::AppError;
use crate::models::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

/// 문서 조회 공통 SELECT. 최신 버전 번호는 버전 테이블에서 계산합니다.
const DOCUMENT_SELECT: &str = r#"
    SELECT d.id, d.name, d.description, d.created_at,
           (SELECT MAX(v.version_number) FROM document_versions v WHERE v.document_id = d.id)
               AS latest_version
    FROM documents d
"#;

/// 모든 문서를 최근 생성 순으로 조회합니다.
pub async fn list_documents(pool: &SqlitePool) -> Result<Vec<Document>, AppError> {
    let docs = sqlx::query_as::<_, Document>(&format!(
        "{DOCUMENT_SELECT} ORDER BY d.created_at DESC, d.id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(docs)
}

/// ID로 단일 문서를 조회합니다.
///
/// - `Ok(Some(Document))`: 문서를 찾은 경우
/// - `Ok(None)`: 해당 ID의 문서가 없는 경우
pub async fn get_document(pool: &SqlitePool, id: i64) -> Result<Option<Document>, AppError> {
    let doc = sqlx::query_as::<_, Document>(&format!("{DOCUMENT_SELECT} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(doc)
}

/// 버전 없이 빈 문서를 생성합니다.
pub async fn create_document(
    pool: &SqlitePool,
    req: &CreateDocumentRequest,
) -> Result<Document, AppError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO documents (name, description)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(req.name.trim())
    .bind(&req.description)
    .fetch_one(pool)
    .await?;

    get_document(pool, id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created document".to_string()))
}

/// 이름/설명만 수정합니다. 버전 체인은 건드리지 않습니다.
pub async fn update_document(
    pool: &SqlitePool,
    id: i64,
    req: &UpdateDocumentRequest,
) -> Result<Option<Document>, AppError> {
    if get_document(pool, id).await?.is_none() {
        return Ok(None);
    }

    if req.name.is_none() && req.description.is_none() {
        return get_document(pool, id).await;
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE documents SET ");
    let mut fields = query.separated(", ");
    if let Some(name) = &req.name {
        fields.push("name = ").push_bind_unseparated(name.trim().to_string());
    }
    if let Some(description) = &req.description {
        fields.push("description = ").push_bind_unseparated(description.clone());
    }
    query.push(" WHERE id = ").push_bind(id);
    query.build().execute(pool).await?;

    get_document(pool, id).await
}

pub async fn document_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM documents WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

/// 문서를 참조하는 절차-문서 연결 행을 모두 삭제합니다.
pub async fn delete_document_links(
    conn: &mut SqliteConnection,
    document_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM procedure_documents WHERE document_id = ?")
        .bind(document_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// 문서 행 자체를 삭제합니다. 버전과 연결 행은 먼저 지워져 있어야 합니다.
pub async fn delete_document_row(conn: &mut SqliteConnection, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

