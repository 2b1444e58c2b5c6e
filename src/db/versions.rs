//! 버전 바이트 저장소.
//!
//! 불투명한 바이트 버퍼와 MIME 태그를 버전 ID로 읽고 씁니다.
//! 크기 제한이나 형식 검증 같은 규칙은 `services::versioning`이 담당합니다.

use crate::error::AppError;
use crate::models::{AppendedVersion, DocumentVersion, DocumentVersionSummary};
use sqlx::{SqliteConnection, SqlitePool};

/// 저장할 버전 한 건. 검증과 해시 계산은 호출자가 끝낸 상태입니다.
#[derive(Debug, Clone, Copy)]
pub struct BlobWrite<'a> {
    pub bytes: &'a [u8],
    pub mime_type: Option<&'a str>,
    pub content_hash: &'a str,
    pub uploaded_by: Option<i64>,
}

const VERSION_SELECT: &str = r#"
    SELECT v.id, v.document_id, d.name AS document_name, v.version_number, v.file_bytes,
           v.mime_type, v.size_bytes, v.content_hash, v.uploaded_by, v.uploaded_at
    FROM document_versions v
    JOIN documents d ON d.id = v.document_id
"#;

/// 다음 버전 번호 계산과 삽입을 한 문장으로 수행합니다.
///
/// `MAX(version_number) + 1` 읽기와 INSERT가 같은 문장 안에 있으므로
/// SQLite의 쓰기 잠금 아래에서 원자적으로 실행됩니다.
/// 그래도 같은 번호가 나오면 (document_id, version_number) UNIQUE 제약이 거부합니다.
pub async fn insert_next_version(
    pool: &SqlitePool,
    document_id: i64,
    blob: BlobWrite<'_>,
) -> Result<AppendedVersion, AppError> {
    let (version_id, version_number): (i64, i64) = sqlx::query_as(
        r#"
        INSERT INTO document_versions
            (document_id, version_number, file_bytes, mime_type, size_bytes, content_hash, uploaded_by)
        SELECT ?, COALESCE(MAX(version_number), 0) + 1, ?, ?, ?, ?, ?
        FROM document_versions
        WHERE document_id = ?
        RETURNING id, version_number
        "#,
    )
    .bind(document_id)
    .bind(blob.bytes)
    .bind(blob.mime_type)
    .bind(blob.bytes.len() as i64)
    .bind(blob.content_hash)
    .bind(blob.uploaded_by)
    .bind(document_id)
    .fetch_one(pool)
    .await?;

    Ok(AppendedVersion {
        version_id,
        version_number,
    })
}

/// 문서의 가장 높은 번호 버전을 바이트와 함께 조회합니다.
pub async fn get_latest_version(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<Option<DocumentVersion>, AppError> {
    let version = sqlx::query_as::<_, DocumentVersion>(&format!(
        "{VERSION_SELECT} WHERE v.document_id = ? ORDER BY v.version_number DESC LIMIT 1"
    ))
    .bind(document_id)
    .fetch_optional(pool)
    .await?;

    Ok(version)
}

pub async fn get_version(
    pool: &SqlitePool,
    version_id: i64,
) -> Result<Option<DocumentVersion>, AppError> {
    let version = sqlx::query_as::<_, DocumentVersion>(&format!("{VERSION_SELECT} WHERE v.id = ?"))
        .bind(version_id)
        .fetch_optional(pool)
        .await?;

    Ok(version)
}

/// 바이트를 제외한 버전 메타데이터를 번호 내림차순으로 조회합니다.
pub async fn list_versions(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<Vec<DocumentVersionSummary>, AppError> {
    let versions = sqlx::query_as::<_, DocumentVersionSummary>(
        r#"
        SELECT id, document_id, version_number, mime_type, size_bytes, content_hash,
               uploaded_by, uploaded_at
        FROM document_versions
        WHERE document_id = ?
        ORDER BY version_number DESC
        "#,
    )
    .bind(document_id)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

/// 문서의 버전 체인 전체를 삭제합니다. 문서 삭제 트랜잭션 안에서만 호출됩니다.
pub async fn delete_versions_for_document(
    conn: &mut SqliteConnection,
    document_id: i64,
) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM document_versions WHERE document_id = ?")
        .bind(document_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
