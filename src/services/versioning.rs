//! # 문서 버전 체인 관리
//!
//! 문서마다 1부터 시작해 단조 증가하는 버전 번호를 부여합니다.
//! 버전은 추가만 가능하고, 개별 버전은 수정하거나 삭제하지 않습니다.
//! 체인 전체는 문서 삭제 시 한 트랜잭션 안에서 함께 사라집니다.
//!
//! ## 동시 추가
//! 같은 문서에 동시에 두 업로드가 들어와도 같은 번호를 받지 않아야 합니다.
//! 번호 계산과 삽입은 `db::insert_next_version`의 단일 문장으로 직렬화되고,
//! (document_id, version_number) UNIQUE 제약에 걸리면 한 번 재시도한 뒤 `Conflict`로 보고합니다.

use crate::{
    db::{self, BlobWrite},
    error::AppError,
    models::*,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::future::Future;

/// 업로드 한 건의 크기와 형식을 검증하고, 저장할 파일 형식을 돌려줍니다.
///
/// 1. 크기가 `max_bytes`를 넘으면 `FileTooLarge`
/// 2. 선언된 MIME 타입이 허용 목록에 있으면 그 형식
/// 3. 아니면 원본 파일명 확장자로 판별, 그래도 없으면 `InvalidFileType`
pub fn validate_upload(upload: &NewVersion, max_bytes: usize) -> Result<FileKind, AppError> {
    if upload.bytes.len() > max_bytes {
        return Err(AppError::FileTooLarge { limit: max_bytes });
    }

    upload
        .mime_type
        .as_deref()
        .and_then(FileKind::from_mime)
        .or_else(|| upload.file_name.as_deref().and_then(FileKind::from_file_name))
        .ok_or(AppError::InvalidFileType)
}

/// 바이트의 SHA-256 해시 (소문자 16진수)
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// 문서에 새 버전을 추가하고 부여된 번호를 반환합니다.
pub async fn append_version(
    pool: &SqlitePool,
    document_id: i64,
    upload: &NewVersion,
    max_bytes: usize,
) -> Result<AppendedVersion, AppError> {
    ensure_document(pool, document_id).await?;
    let kind = validate_upload(upload, max_bytes)?;
    let hash = content_hash(&upload.bytes);

    let blob = BlobWrite {
        bytes: &upload.bytes,
        mime_type: Some(kind.mime_type()),
        content_hash: &hash,
        uploaded_by: upload.uploaded_by,
    };

    let appended =
        retry_on_number_race(document_id, || db::insert_next_version(pool, document_id, blob))
            .await?;

    tracing::info!(
        document_id,
        version_id = appended.version_id,
        version_number = appended.version_number,
        size_bytes = upload.bytes.len(),
        mime_type = kind.mime_type(),
        "appended document version"
    );

    Ok(appended)
}

/// 번호 삽입이 UNIQUE 위반이면 한 번만 다시 시도하고, 또 위반이면 `Conflict`로 보고합니다.
async fn retry_on_number_race<F, Fut>(
    document_id: i64,
    mut insert: F,
) -> Result<AppendedVersion, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<AppendedVersion, AppError>>,
{
    match insert().await {
        Err(err) if err.is_unique_violation() => {
            tracing::warn!(document_id, "version number race detected, retrying once");
            insert().await.map_err(|err| {
                if err.is_unique_violation() {
                    AppError::Conflict(format!(
                        "Concurrent upload to document {} could not be assigned a version number",
                        document_id
                    ))
                } else {
                    err
                }
            })
        }
        other => other,
    }
}

/// 가장 높은 번호의 버전. 문서가 없거나 버전이 하나도 없으면 `NotFound`.
pub async fn get_latest_version(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<DocumentVersion, AppError> {
    db::get_latest_version(pool, document_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// 버전 메타데이터(바이트 제외)를 번호 내림차순으로 반환합니다.
pub async fn list_versions(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<Vec<DocumentVersionSummary>, AppError> {
    ensure_document(pool, document_id).await?;
    db::list_versions(pool, document_id).await
}

/// 버전 하나를 바이트와 상위 문서 이름까지 포함해 조회합니다.
pub async fn get_version_by_id(
    pool: &SqlitePool,
    version_id: i64,
) -> Result<DocumentVersion, AppError> {
    db::get_version(pool, version_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// 문서 삭제 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentDeletion {
    pub versions_deleted: u64,
    pub procedure_links_deleted: u64,
}

/// 절차 연결 행, 모든 버전, 문서 행을 하나의 트랜잭션으로 삭제합니다.
///
/// 버전이 하나도 없는 문서도 삭제됩니다. 중간에 실패하면 트랜잭션이 drop되며 전부 롤백됩니다.
pub async fn delete_document(
    pool: &SqlitePool,
    document_id: i64,
) -> Result<DocumentDeletion, AppError> {
    let mut tx = pool.begin().await?;

    if !db::document_exists(&mut tx, document_id).await? {
        return Err(AppError::NotFound);
    }

    let procedure_links_deleted = db::delete_document_links(&mut tx, document_id).await?;
    let versions_deleted = db::delete_versions_for_document(&mut tx, document_id).await?;
    db::delete_document_row(&mut tx, document_id).await?;

    tx.commit().await?;

    tracing::info!(
        document_id,
        versions_deleted,
        procedure_links_deleted,
        "deleted document and its version chain"
    );

    Ok(DocumentDeletion {
        versions_deleted,
        procedure_links_deleted,
    })
}

async fn ensure_document(pool: &SqlitePool, document_id: i64) -> Result<(), AppError> {
    let mut conn = pool.acquire().await?;
    if db::document_exists(&mut conn, document_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}
