//! # 문서 버전(Version) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `POST /api/v1/documents/{id}/versions`        → multipart `file` 필드로 새 버전 업로드
//! - `GET  /api/v1/documents/{id}/versions`        → 버전 메타데이터 목록 (번호 내림차순)
//! - `GET  /api/v1/documents/{id}/view`            → 최신 버전을 브라우저에 표시 (inline)
//! - `GET  /api/v1/documents/{id}/download`        → 최신 버전 다운로드 (attachment)
//! - `GET  /api/v1/versions/{version_id}/download` → 특정 버전 다운로드 (attachment)

use crate::{
    error::AppError,
    middleware::auth::AuthUser,
    models::*,
    services::{
        content::{self, Disposition},
        versioning,
    },
};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{
        header::{
            ACCESS_CONTROL_EXPOSE_HEADERS, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ETAG,
        },
        HeaderValue, StatusCode,
    },
    response::Response,
    Json,
};
use serde_json::{json, Value};

use super::AppState;

/// 업로드 파일을 담는 multipart 필드 이름
const FILE_FIELD: &str = "file";

/// 브라우저 스크립트가 읽을 수 있어야 하는 응답 헤더
const EXPOSED_HEADERS: &str = "Content-Disposition, Content-Type, Content-Length, ETag";

/// `POST /documents/{id}/versions`
///
/// 크기/형식 검증은 버전 관리 서비스가 합니다. 여기서는 multipart에서 파일 필드만 꺼냅니다.
pub async fn upload_version(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AppendedVersion>), AppError> {
    let document_id = parse_id(&id)?;

    let mut upload: Option<NewVersion> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.max_upload_bytes))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, state.max_upload_bytes))?;

        upload = Some(NewVersion {
            bytes: bytes.to_vec(),
            mime_type,
            file_name,
            uploaded_by: Some(auth_user.user_id),
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::InvalidArgument(format!("Multipart field '{}' is required", FILE_FIELD))
    })?;

    let appended =
        versioning::append_version(&state.pool, document_id, &upload, state.max_upload_bytes)
            .await?;
    Ok((StatusCode::CREATED, Json(appended)))
}

/// `GET /documents/{id}/versions`
pub async fn list_document_versions(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let document_id = parse_id(&id)?;
    let versions = versioning::list_versions(&state.pool, document_id).await?;
    Ok(Json(json!({ "versions": versions })))
}

/// `GET /documents/{id}/view`
pub async fn view_latest_version(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let document_id = parse_id(&id)?;
    let version = versioning::get_latest_version(&state.pool, document_id).await?;
    blob_response(version, Disposition::Inline)
}

/// `GET /documents/{id}/download`
pub async fn download_latest_version(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let document_id = parse_id(&id)?;
    let version = versioning::get_latest_version(&state.pool, document_id).await?;
    blob_response(version, Disposition::Attachment)
}

/// `GET /versions/{version_id}/download`
pub async fn download_version(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(version_id): Path<String>,
) -> Result<Response, AppError> {
    let version_id = parse_id(&version_id)?;
    let version = versioning::get_version_by_id(&state.pool, version_id).await?;
    blob_response(version, Disposition::Attachment)
}

/// 저장된 바이트를 그대로 본문에 싣고, 콘텐츠 협상 결과를 헤더로 붙입니다.
fn blob_response(version: DocumentVersion, disposition: Disposition) -> Result<Response, AppError> {
    let headers = content::build_content_headers(&version, disposition);
    let version_id = version.id;
    let to_value = |value: String| {
        HeaderValue::try_from(value).map_err(|_| {
            AppError::Internal(format!("Version {} produced an invalid header value", version_id))
        })
    };

    let content_type = to_value(headers.content_type)?;
    let content_disposition = to_value(headers.content_disposition)?;
    let etag = to_value(headers.etag)?;

    tracing::debug!(
        version_id,
        document_id = version.document_id,
        disposition = disposition.as_str(),
        content_length = headers.content_length,
        "serving document version"
    );

    let mut response = Response::new(Body::from(version.file_bytes));
    let response_headers = response.headers_mut();
    response_headers.insert(CONTENT_TYPE, content_type);
    response_headers.insert(CONTENT_DISPOSITION, content_disposition);
    response_headers.insert(CONTENT_LENGTH, HeaderValue::from(headers.content_length));
    response_headers.insert(ETAG, etag);
    response_headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );

    Ok(response)
}

/// 본문 크기 제한에 걸린 multipart 오류는 `FileTooLarge`, 나머지는 잘못된 요청입니다.
fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge { limit }
    } else {
        AppError::InvalidArgument(err.body_text())
    }
}
