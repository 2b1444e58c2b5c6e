//! # 라우트 핸들러 모듈
//!
//! HTTP 요청을 처리하는 핸들러 함수들과 `/api/v1` 라우터 조립을 담당합니다.
//!
//! 각 하위 모듈:
//! - `departments`: 부서 CRUD, 통계, 구성원/절차 목록, 연쇄 삭제
//! - `documents`: 문서 메타데이터 CRUD
//! - `health`: 서버 상태 확인 (헬스체크)
//! - `procedures`: 절차 CRUD와 절차-문서 연결
//! - `subprocesses`: 하위 프로세스 CRUD
//! - `versions`: 버전 업로드, 목록, 보기/다운로드

pub mod departments;
pub mod documents;
pub mod health;
pub mod procedures;
pub mod subprocesses;
pub mod versions;

pub use departments::*;
pub use documents::*;
pub use health::*;
pub use procedures::*;
pub use subprocesses::*;
pub use versions::*;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// multipart 경계와 헤더가 차지하는 여유분
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 검증용 비밀키
    pub jwt_secret: String,
    /// 버전 하나의 최대 바이트 수
    pub max_upload_bytes: usize,
}

/// `CORS_ALLOWED_ORIGIN`(쉼표 구분)으로 CORS 레이어를 만듭니다. 비어 있으면 모든 출처 허용.
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origin
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// `/api/v1` 아래에 모든 라우트를 묶은 라우터를 만듭니다.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    // 크기 초과 업로드도 핸들러까지 도달해야 `FileTooLarge`로 보고할 수 있습니다.
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes * 2 + MULTIPART_OVERHEAD_BYTES);

    let api_routes = Router::new()
        // 문서
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
        // 버전
        .route(
            "/documents/{id}/versions",
            get(list_document_versions).post(upload_version),
        )
        .route("/documents/{id}/view", get(view_latest_version))
        .route("/documents/{id}/download", get(download_latest_version))
        .route("/versions/{version_id}/download", get(download_version))
        // 절차
        .route("/procedures", get(list_procedures).post(create_procedure))
        .route(
            "/procedures/{id}",
            get(get_procedure).patch(update_procedure).delete(delete_procedure),
        )
        .route(
            "/procedures/{id}/documents",
            get(list_procedure_documents).post(attach_document),
        )
        .route(
            "/procedures/{id}/documents/{document_id}",
            delete(detach_document),
        )
        .route("/users/{id}/procedures", get(list_user_procedures))
        // 하위 프로세스
        .route("/subprocesses", get(list_subprocesses).post(create_subprocess))
        .route(
            "/subprocesses/{id}",
            get(get_subprocess).patch(update_subprocess).delete(delete_subprocess),
        )
        .route("/subprocesses/{id}/procedures", get(list_subprocess_procedures))
        // 부서
        .route("/departments", get(list_departments).post(create_department))
        .route("/departments/stats", get(department_stats))
        .route(
            "/departments/{id}",
            get(get_department).patch(update_department).delete(delete_department),
        )
        .route("/departments/{id}/members", get(list_department_members))
        .route("/departments/{id}/procedures", get(list_department_procedures))
        // 헬스체크
        .route("/health", get(health_check))
        .layer(body_limit)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
