use serde::{Deserialize, Serialize};

/// 문서 엔티티. 파일 바이트는 직접 갖지 않고 버전 체인이 소유합니다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    /// 가장 최근 버전 번호. 버전이 하나도 없으면 None
    pub latest_version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
}
