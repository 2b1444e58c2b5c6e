//! # 문서(Document) 라우트 핸들러
//!
//! 문서 메타데이터의 CRUD를 처리합니다. 바이트는 `versions` 모듈이 다룹니다.
//!
//! ## 엔드포인트
//! - `GET    /api/v1/documents`      → 문서 목록 (생성일 내림차순)
//! - `POST   /api/v1/documents`      → 버전 없는 새 문서 생성
//! - `GET    /api/v1/documents/{id}` → 단일 문서 조회 (`latest_version` 포함)
//! - `PATCH  /api/v1/documents/{id}` → 이름/설명 수정
//! - `DELETE /api/v1/documents/{id}` → 문서, 모든 버전, 절차 연결을 함께 삭제
//!
//! 경로의 `{id}`는 문자열로 받아 `parse_id`로 검증하므로, 숫자가 아니면 400 `invalid_argument`입니다.

use crate::{
    db,
    error::AppError,
    middleware::{
        auth::AuthUser,
        extract::ApiJson,
    },
    models::*,
    services::versioning::{self, DocumentDeletion},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::AppState;

/// `GET /documents`
pub async fn list_documents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let documents = db::list_documents(&state.pool).await?;
    Ok(Json(json!({ "documents": documents })))
}

/// `GET /documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let id = parse_id(&id)?;
    let document = db::get_document(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(document))
}

/// `POST /documents`: 이름은 비어 있으면 안 됩니다.
pub async fn create_document(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ApiJson(req): ApiJson<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidArgument("Document name is required".to_string()));
    }

    let document = db::create_document(&state.pool, &req).await?;
    tracing::info!(document_id = document.id, "created document");
    Ok((StatusCode::CREATED, Json(document)))
}

/// `PATCH /documents/{id}`: 본문에 포함된 필드만 수정합니다.
pub async fn update_document(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDocumentRequest>,
) -> Result<Json<Document>, AppError> {
    let id = parse_id(&id)?;
    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::InvalidArgument("Document name cannot be empty".to_string()));
    }

    let document = db::update_document(&state.pool, id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(document))
}

/// `DELETE /documents/{id}`: 삭제된 버전 수와 연결 수를 돌려줍니다.
pub async fn delete_document(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DocumentDeletion>, AppError> {
    let id = parse_id(&id)?;
    let deletion = versioning::delete_document(&state.pool, id).await?;
    Ok(Json(deletion))
}
