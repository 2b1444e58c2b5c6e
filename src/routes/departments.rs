//! # 부서(Department) 라우트 핸들러
//!
//! ## 엔드포인트
//! - `GET    /api/v1/departments`                  → 목록 (구성원/하위 프로세스/절차 수 포함)
//! - `POST   /api/v1/departments`                  → 생성 (관리자)
//! - `GET    /api/v1/departments/stats`            → 전체 통계
//! - `GET    /api/v1/departments/{id}`             → 단일 조회 (부서장 이름 포함)
//! - `PATCH  /api/v1/departments/{id}`             → 부분 수정 (관리자)
//! - `DELETE /api/v1/departments/{id}`             → 하위 전체 연쇄 삭제 (관리자)
//! - `GET    /api/v1/departments/{id}/members`     → 구성원 목록
//! - `GET    /api/v1/departments/{id}/procedures`  → 부서 절차 목록 (구성원/관리자)
//!
//! 부서장 지정과 삭제는 여러 테이블을 고치므로 `services::cascade`를 거칩니다.

use crate::{
    db,
    error::AppError,
    middleware::{
        auth::AuthUser,
        extract::ApiJson,
    },
    models::*,
    services::cascade::{self, DepartmentDeletion},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use super::AppState;

async fn load_department(state: &AppState, id: i64) -> Result<Department, AppError> {
    db::get_department(&state.pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// `GET /departments`
pub async fn list_departments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let departments = db::list_departments(&state.pool).await?;
    Ok(Json(json!({ "departments": departments })))
}

/// `GET /departments/stats`
pub async fn department_stats(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<DepartmentStats>, AppError> {
    Ok(Json(db::department_stats(&state.pool).await?))
}

/// `GET /departments/{id}`
pub async fn get_department(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Department>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(load_department(&state, id).await?))
}

/// `POST /departments`
pub async fn create_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    auth_user.require_admin()?;
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidArgument("Department name is required".to_string()));
    }

    let department = cascade::create_department(&state.pool, &req).await?;
    Ok((StatusCode::CREATED, Json(department)))
}

/// `PATCH /departments/{id}`
pub async fn update_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateDepartmentRequest>,
) -> Result<Json<Department>, AppError> {
    auth_user.require_admin()?;
    let id = parse_id(&id)?;
    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::InvalidArgument("Department name cannot be empty".to_string()));
    }

    let department = cascade::update_department(&state.pool, id, &req).await?;
    Ok(Json(department))
}

/// `DELETE /departments/{id}`: 삭제된 하위 항목 수를 돌려줍니다.
pub async fn delete_department(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DepartmentDeletion>, AppError> {
    auth_user.require_admin()?;
    let id = parse_id(&id)?;

    let deletion = cascade::delete_department(&state.pool, id).await?;
    Ok(Json(deletion))
}

/// `GET /departments/{id}/members`
pub async fn list_department_members(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    load_department(&state, id).await?;
    let members = db::list_department_members(&state.pool, id).await?;
    Ok(Json(json!({ "members": members })))
}

/// `GET /departments/{id}/procedures`
pub async fn list_department_procedures(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    if !auth_user.belongs_to(id) {
        return Err(AppError::Forbidden(format!(
            "Only members of department {} can list its procedures",
            id
        )));
    }

    load_department(&state, id).await?;
    let procedures = db::list_procedures_by_department(&state.pool, id).await?;
    Ok(Json(json!({ "procedures": procedures })))
}
