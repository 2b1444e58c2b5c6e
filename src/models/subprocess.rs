use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subprocess {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub department_id: i64,
    pub department_name: Option<String>,
    /// 이 하위 프로세스를 참조하는 절차 수. 0보다 크면 삭제할 수 없습니다.
    pub procedure_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubprocessRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "super::positive_id")]
    pub department_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubprocessRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::optional_positive_id")]
    pub department_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubprocessListQuery {
    #[serde(default, deserialize_with = "super::optional_positive_id")]
    pub department_id: Option<i64>,
}
