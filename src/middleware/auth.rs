//! # 신원(Identity) 추출기
//!
//! `Authorization: Bearer <jwt>` 헤더를 검증해 호출자의 신원을 꺼냅니다.
//! 로그인/토큰 발급 화면은 이 서비스 밖에 있고, 여기서는 서명 검증과 권한 판정만 합니다.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{error::AppError, routes::AppState};

/// 액세스 토큰 유효 시간
const ACCESS_TOKEN_TTL_MINUTES: i64 = 60;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64, // user id
    pub role: String,
    pub department_id: Option<i64>,
    #[serde(default)]
    pub can_manage_procedures: bool,
    #[serde(default)]
    pub is_department_head: bool,
    pub exp: i64,
    pub iat: i64,
}

/// 검증된 호출자 신원
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
    pub department_id: Option<i64>,
    pub can_manage_procedures: bool,
    pub is_department_head: bool,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator role required".to_string()))
        }
    }

    /// 관리자이거나 해당 부서의 부서장
    pub fn can_manage_department(&self, department_id: i64) -> bool {
        self.is_admin() || (self.is_department_head && self.department_id == Some(department_id))
    }

    /// 관리자이거나 해당 부서의 구성원
    pub fn belongs_to(&self, department_id: i64) -> bool {
        self.is_admin() || self.department_id == Some(department_id)
    }

    pub fn can_delete_procedures(&self) -> bool {
        self.is_admin() || self.can_manage_procedures
    }

    /// 절차 수정/문서 연결: 담당자 본인, 절차 관리 권한자, 관리자
    pub fn can_edit_procedure(&self, responsible_id: i64) -> bool {
        self.can_delete_procedures() || self.user_id == responsible_id
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            user_id: claims.sub,
            role: claims.role,
            department_id: claims.department_id,
            can_manage_procedures: claims.can_manage_procedures,
            is_department_head: claims.is_department_head,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let claims = verify_access_token(token, &state.jwt_secret)?;

        Ok(AuthUser::from(claims))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            AuthError::MissingToken => ("missing_token", "Authorization token is required"),
            AuthError::InvalidToken => ("invalid_token", "Invalid authorization token"),
            AuthError::ExpiredToken => ("expired_token", "Authorization token has expired"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

pub fn create_access_token(
    user: &AuthUser,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id,
        role: user.role.clone(),
        department_id: user.department_id,
        can_manage_procedures: user.can_manage_procedures,
        is_department_head: user.is_department_head,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, department_id: Option<i64>) -> AuthUser {
        AuthUser {
            user_id: 7,
            role: role.to_string(),
            department_id,
            can_manage_procedures: false,
            is_department_head: false,
        }
    }

    #[test]
    fn token_round_trip_keeps_identity() {
        let mut identity = user("user", Some(3));
        identity.is_department_head = true;

        let token = create_access_token(&identity, "secret").unwrap();
        let claims = verify_access_token(&token, "secret").unwrap();
        assert_eq!(AuthUser::from(claims), identity);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = create_access_token(&user("user", None), "secret").unwrap();
        assert_eq!(
            verify_access_token(&token, "other").unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: 1,
            role: "user".to_string(),
            department_id: None,
            can_manage_procedures: false,
            is_department_head: false,
            iat: past.timestamp(),
            exp: (past + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert_eq!(
            verify_access_token(&token, "secret").unwrap_err(),
            AuthError::ExpiredToken
        );
    }

    #[test]
    fn department_head_manages_only_own_department() {
        let mut head = user("user", Some(3));
        head.is_department_head = true;
        assert!(head.can_manage_department(3));
        assert!(!head.can_manage_department(4));

        let member = user("user", Some(3));
        assert!(!member.can_manage_department(3));
        assert!(member.belongs_to(3));
        assert!(!member.belongs_to(4));

        let admin = user(ADMIN_ROLE, None);
        assert!(admin.can_manage_department(4));
        assert!(admin.belongs_to(4));
        assert!(admin.require_admin().is_ok());
        assert!(matches!(member.require_admin(), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn procedure_edit_rights() {
        let responsible = user("user", None);
        assert!(responsible.can_edit_procedure(7));
        assert!(!responsible.can_edit_procedure(8));
        assert!(!responsible.can_delete_procedures());

        let mut manager = user("user", None);
        manager.can_manage_procedures = true;
        assert!(manager.can_edit_procedure(8));
        assert!(manager.can_delete_procedures());
    }
}
