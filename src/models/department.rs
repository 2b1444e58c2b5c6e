//! # 부서 모델 정의
//!
//! - `Department`: 단일 부서 조회 응답 (부서장 이름 포함)
//! - `DepartmentSummary`: 목록 응답 (구성원/하위 프로세스/절차 수 포함)
//! - `DepartmentStats`: 전체 통계

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// 부서장 사용자 ID (없을 수 있음)
    pub head_id: Option<i64>,
    pub head_name: Option<String>,
    pub secretariat_id: Option<i64>,
    pub is_active: bool,
    pub last_modified: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub head_id: Option<i64>,
    pub head_name: Option<String>,
    pub secretariat_id: Option<i64>,
    pub is_active: bool,
    pub last_modified: String,
    pub member_count: i64,
    pub subprocess_count: i64,
    pub procedure_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepartmentStats {
    pub total_departments: i64,
    pub active_departments: i64,
    pub total_heads: i64,
    pub total_procedures: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::optional_positive_id")]
    pub head_id: Option<i64>,
    #[serde(default, deserialize_with = "super::optional_positive_id")]
    pub secretariat_id: Option<i64>,
}

/// 부서 수정 요청 (부분 업데이트)
///
/// `head_id`: None = 변경 안 함, Some(None) = 부서장 해제, Some(Some(id)) = 부서장 지정
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDepartmentRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option_id")]
    pub head_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::double_option_id")]
    pub secretariat_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}
