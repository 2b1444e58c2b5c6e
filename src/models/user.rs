//! # 사용자 모델
//!
//! 로그인/계정 관리는 이 백엔드의 범위 밖입니다.
//! 여기의 `User`는 부서 구성원, 부서장, 절차 담당자를 가리키기 위한 최소 정보만 가집니다.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    /// "admin" 또는 "user"
    pub role: String,
    /// 소속 부서. 부서가 삭제되면 NULL로 분리됩니다.
    pub department_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department_id: Option<i64>,
}
