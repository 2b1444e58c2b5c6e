//! # 절차(Procedure) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/procedures`                              → 전체 절차 목록
//! - `POST   /api/v1/procedures`                              → 절차 생성 (담당자 = 호출자)
//! - `GET    /api/v1/procedures/{id}`                         → 단일 절차
//! - `PATCH  /api/v1/procedures/{id}`                         → 부분 수정 (담당자/절차 관리자/관리자)
//! - `DELETE /api/v1/procedures/{id}`                         → 삭제 (절차 관리자/관리자)
//! - `GET    /api/v1/procedures/{id}/documents`               → 연결된 문서 목록
//! - `POST   /api/v1/procedures/{id}/documents`               → 문서 연결 (중복이면 변화 없음)
//! - `DELETE /api/v1/procedures/{id}/documents/{document_id}` → 문서 연결 해제
//! - `GET    /api/v1/users/{id}/procedures`                   → 사용자가 담당/작성/수정한 절차

use crate::{
    db,
    error::AppError,
    middleware::{
        auth::AuthUser,
        extract::ApiJson,
    },
    models::*,
    services::cascade,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::AppState;

/// 요청 본문의 상태 문자열을 닫힌 열거형으로 바꿉니다. 알 수 없는 값은 400.
fn parse_status(raw: Option<&str>) -> Result<Option<ProcedureStatus>, AppError> {
    raw.map(str::parse::<ProcedureStatus>)
        .transpose()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))
}

async fn load_procedure(state: &AppState, id: i64) -> Result<Procedure, AppError> {
    db::get_procedure(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

fn ensure_can_edit(auth_user: &AuthUser, procedure: &Procedure) -> Result<(), AppError> {
    if auth_user.can_edit_procedure(procedure.responsible_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to modify procedure {}",
            procedure.id
        )))
    }
}

/// `GET /procedures`
pub async fn list_procedures(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let procedures = db::list_procedures(&state.pool).await?;
    Ok(Json(json!({ "procedures": procedures })))
}

/// `GET /procedures/{id}`
pub async fn get_procedure(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Procedure>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(load_procedure(&state, id).await?))
}

/// `POST /procedures`: 상태가 없을 때만 `Created`로 시작합니다.
pub async fn create_procedure(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<CreateProcedureRequest>,
) -> Result<(StatusCode, Json<Procedure>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::InvalidArgument("Procedure title is required".to_string()));
    }
    let status = parse_status(req.status.as_deref())?.unwrap_or(ProcedureStatus::Created);

    let procedure = db::create_procedure(&state.pool, &req, status, auth_user.user_id).await?;
    tracing::info!(
        procedure_id = procedure.id,
        subprocess_id = procedure.subprocess_id,
        status = %procedure.status,
        "created procedure"
    );
    Ok((StatusCode::CREATED, Json(procedure)))
}

/// `PATCH /procedures/{id}`: 상태가 없으면 기존 상태를 유지합니다.
pub async fn update_procedure(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProcedureRequest>,
) -> Result<Json<Procedure>, AppError> {
    let id = parse_id(&id)?;
    let existing = load_procedure(&state, id).await?;
    ensure_can_edit(&auth_user, &existing)?;

    if req.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(AppError::InvalidArgument("Procedure title cannot be empty".to_string()));
    }
    let status = parse_status(req.status.as_deref())?;

    let procedure = db::update_procedure(&state.pool, id, &req, status, auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(procedure))
}

/// `DELETE /procedures/{id}`
pub async fn delete_procedure(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !auth_user.can_delete_procedures() {
        return Err(AppError::Forbidden("Not allowed to delete procedures".to_string()));
    }

    cascade::delete_procedure(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /procedures/{id}/documents`
pub async fn list_procedure_documents(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    load_procedure(&state, id).await?;
    let documents = db::list_procedure_documents(&state.pool, id).await?;
    Ok(Json(json!({ "documents": documents })))
}

/// `POST /procedures/{id}/documents`: 새로 연결되면 201, 이미 연결되어 있으면 200.
pub async fn attach_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AttachDocumentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let id = parse_id(&id)?;
    let procedure = load_procedure(&state, id).await?;
    ensure_can_edit(&auth_user, &procedure)?;

    let added = cascade::attach_document(&state.pool, id, req.document_id).await?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(json!({ "added": added }))))
}

/// `DELETE /procedures/{id}/documents/{document_id}`
pub async fn detach_document(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, document_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let document_id = parse_id(&document_id)?;
    let procedure = load_procedure(&state, id).await?;
    ensure_can_edit(&auth_user, &procedure)?;

    if !db::detach_document(&state.pool, id, document_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/procedures`: 본인 또는 관리자만 조회할 수 있습니다.
pub async fn list_user_procedures(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&id)?;
    if auth_user.user_id != user_id && !auth_user.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can list another user's procedures".to_string(),
        ));
    }

    let procedures = db::list_procedures_by_user(&state.pool, user_id).await?;
    Ok(Json(json!({ "procedures": procedures })))
}
