//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: JWT 토큰 검증에 사용할 비밀키 (필수)
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `MAX_UPLOAD_BYTES`: 문서 버전 하나의 최대 크기 (기본 10MB)
//! - `DB_MAX_CONNECTIONS`: 연결 풀 크기
//! - `CORS_ALLOWED_ORIGIN`: 허용할 출처 목록 (쉼표 구분, 없으면 모두 허용)

use std::env;

/// 업로드 한 건의 기본 최대 크기: 10MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// 애플리케이션 전체 설정을 담는 구조체
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 URL (예: "sqlite:data/procdocs.db")
    pub database_url: String,
    /// JWT 토큰 서명/검증에 사용하는 비밀키
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub db_max_connections: u32,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 5),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        })
    }
}

/// 환경변수를 숫자로 파싱하고, 없거나 파싱에 실패하면 기본값을 사용합니다.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
