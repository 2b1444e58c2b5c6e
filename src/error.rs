//! # 에러 처리 모듈
//!
//! 애플리케이션에서 발생할 수 있는 모든 에러 종류를 하나의 닫힌 열거형으로 정의합니다.
//! 문자열 비교로 에러를 구분하지 않고, 항상 `AppError`의 variant로 판별합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 모든 에러 종류를 하나의 타입으로 통합
//! - `AppError::kind()`: 호출자에게 노출되는 안정적인 에러 코드
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 애플리케이션에서 발생할 수 있는 모든 에러 종류
///
/// 각 variant는 적절한 HTTP 상태 코드와 메시지로 변환됩니다.
/// 저장소 내부 정보(쿼리, 드라이버 메시지)는 로그에만 남고 응답에는 포함되지 않습니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 요청한 엔티티가 없음 (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// 잘못된 식별자, 알 수 없는 상태값 등 (HTTP 400)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 허용되지 않는 파일 형식 (HTTP 415)
    #[error("Only Word, PDF and image files are allowed")]
    InvalidFileType,

    /// 업로드 크기 제한 초과 (HTTP 413)
    #[error("File exceeds the maximum size of {limit} bytes")]
    FileTooLarge { limit: usize },

    /// 참조하는 하위 엔티티가 있어 삭제할 수 없음 (HTTP 409)
    #[error("{0}")]
    HasDependents(String),

    /// 동시 버전 추가 경쟁 등 재시도 가능한 충돌 (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 인증 실패 (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 권한 부족 (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 서버 내부 오류 (HTTP 500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// 저장소(SQLite) 오류 (HTTP 500)
    /// #[from]: sqlx::Error에 `?`를 쓰면 자동으로 이 variant로 변환됩니다.
    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AppError {
    /// 응답 본문의 `error.code`로 나가는 안정적인 에러 코드
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::InvalidArgument(_) => "invalid_argument",
            AppError::InvalidFileType => "invalid_file_type",
            AppError::FileTooLarge { .. } => "file_too_large",
            AppError::HasDependents(_) => "has_dependents",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Internal(_) => "internal_error",
            AppError::Storage(_) => "storage_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidFileType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::HasDependents(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// SQLite UNIQUE 제약 위반인지 확인합니다.
    /// 버전 번호 경쟁을 `Conflict`로 바꿀 때 사용합니다.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Storage(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 내부 에러(Storage, Internal)는 실제 내용을 로그에만 기록하고,
    /// 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.kind();
        let message = match self {
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {}", e);
                "A storage error occurred".to_string()
            }
            AppError::InvalidArgument(ref msg)
            | AppError::HasDependents(ref msg)
            | AppError::Unauthorized(ref msg)
            | AppError::Forbidden(ref msg) => msg.clone(),
            _ => self.to_string(),
        };

        // 결과: { "error": { "code": "not_found", "message": "Resource not found" } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
