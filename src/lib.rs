//! # procdocs
//!
//! 부서 → 하위 프로세스 → 절차 → 문서 계층을 관리하는 백엔드 라이브러리입니다.
//! 바이너리(`main.rs`)와 `tests/`의 HTTP 흐름 테스트가 같은 모듈을 사용합니다.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
