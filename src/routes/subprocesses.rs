//! # 하위 프로세스(Subprocess) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/subprocesses?department_id=` → 목록 (부서로 필터 가능)
//! - `POST   /api/v1/subprocesses`                → 생성 (관리자 또는 해당 부서장)
//! - `GET    /api/v1/subprocesses/{id}`           → 단일 조회
//! - `PATCH  /api/v1/subprocesses/{id}`           → 부분 수정
//! - `DELETE /api/v1/subprocesses/{id}`           → 절차가 남아 있으면 409 `has_dependents`
//! - `GET    /api/v1/subprocesses/{id}/procedures` → 소속 절차 목록

use crate::{
    db,
    error::AppError,
    middleware::{
        auth::AuthUser,
        extract::{ApiJson, ApiQuery},
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

fn ensure_can_manage(auth_user: &AuthUser, department_id: i64) -> Result<(), AppError> {
    if auth_user.can_manage_department(department_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Not allowed to manage subprocesses of department {}",
            department_id
        )))
    }
}

async fn load_subprocess(state: &AppState, id: i64) -> Result<Subprocess, AppError> {
    db::get_subprocess(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// `GET /subprocesses`
pub async fn list_subprocesses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    ApiQuery(query): ApiQuery<SubprocessListQuery>,
) -> Result<Json<Value>, AppError> {
    let subprocesses = db::list_subprocesses(&state.pool, query.department_id).await?;
    Ok(Json(json!({ "subprocesses": subprocesses })))
}

/// `GET /subprocesses/{id}`
pub async fn get_subprocess(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Subprocess>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(load_subprocess(&state, id).await?))
}

/// `POST /subprocesses`
pub async fn create_subprocess(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<CreateSubprocessRequest>,
) -> Result<(StatusCode, Json<Subprocess>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidArgument("Subprocess name is required".to_string()));
    }
    ensure_can_manage(&auth_user, req.department_id)?;

    let subprocess = db::create_subprocess(&state.pool, &req).await?;
    tracing::info!(
        subprocess_id = subprocess.id,
        department_id = subprocess.department_id,
        "created subprocess"
    );
    Ok((StatusCode::CREATED, Json(subprocess)))
}

/// `PATCH /subprocesses/{id}`: 다른 부서로 옮길 때는 양쪽 부서 모두 관리 권한이 필요합니다.
pub async fn update_subprocess(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateSubprocessRequest>,
) -> Result<Json<Subprocess>, AppError> {
    let id = parse_id(&id)?;
    let existing = load_subprocess(&state, id).await?;
    ensure_can_manage(&auth_user, existing.department_id)?;
    if let Some(target) = req.department_id {
        ensure_can_manage(&auth_user, target)?;
    }
    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::InvalidArgument("Subprocess name cannot be empty".to_string()));
    }

    let subprocess = db::update_subprocess(&state.pool, id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(subprocess))
}

/// `DELETE /subprocesses/{id}`
pub async fn delete_subprocess(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let existing = load_subprocess(&state, id).await?;
    ensure_can_manage(&auth_user, existing.department_id)?;

    cascade::delete_subprocess(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /subprocesses/{id}/procedures`
pub async fn list_subprocess_procedures(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    load_subprocess(&state, id).await?;
    let procedures = db::list_procedures_by_subprocess(&state.pool, id).await?;
    Ok(Json(json!({ "procedures": procedures })))
}
