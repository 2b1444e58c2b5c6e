//! 요청 처리 전에 끼어드는 계층.
//! - `auth`: JWT 신원 추출기
//! - `extract`: 역직렬화 실패를 `AppError`로 바꾸는 본문/쿼리 추출기

pub mod auth;
pub mod extract;
