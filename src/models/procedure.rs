//! # 절차(Procedure) 모델 정의
//!
//! 절차 상태는 닫힌 열거형 `ProcedureStatus`로만 표현합니다.
//! 알 수 없는 상태 문자열은 기본값으로 바꾸지 않고 경계에서 거부합니다.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureStatus {
    #[serde(rename = "Created")]
    Created,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Under review")]
    UnderReview,
    #[serde(rename = "Published")]
    Published,
    #[serde(rename = "Archived")]
    Archived,
}

/// 알 수 없는 상태 문자열
#[derive(Debug, thiserror::Error)]
#[error("unknown procedure status '{0}'")]
pub struct UnknownStatus(pub String);

impl ProcedureStatus {
    pub const ALL: [ProcedureStatus; 5] = [
        ProcedureStatus::Created,
        ProcedureStatus::InProgress,
        ProcedureStatus::UnderReview,
        ProcedureStatus::Published,
        ProcedureStatus::Archived,
    ];

    /// DB와 JSON에 저장되는 표준 라벨
    pub fn as_str(self) -> &'static str {
        match self {
            ProcedureStatus::Created => "Created",
            ProcedureStatus::InProgress => "In progress",
            ProcedureStatus::UnderReview => "Under review",
            ProcedureStatus::Published => "Published",
            ProcedureStatus::Archived => "Archived",
        }
    }

    /// 기존 화면에서 쓰던 스페인어 라벨
    fn legacy_label(self) -> &'static str {
        match self {
            ProcedureStatus::Created => "creado",
            ProcedureStatus::InProgress => "en elaboración",
            ProcedureStatus::UnderReview => "en revisión",
            ProcedureStatus::Published => "publicado",
            ProcedureStatus::Archived => "archivado",
        }
    }
}

impl fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcedureStatus {
    type Err = UnknownStatus;

    /// 표준 라벨과 고정된 스페인어 라벨만 대소문자 구분 없이 허용합니다.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let needle = raw.trim().to_lowercase();
        ProcedureStatus::ALL
            .into_iter()
            .find(|status| {
                status.as_str().to_lowercase() == needle || status.legacy_label() == needle
            })
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

impl TryFrom<String> for ProcedureStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Procedure {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subprocess_id: i64,
    /// 하위 프로세스를 통해 조인한 소속 부서
    pub department_id: i64,
    pub responsible_id: i64,
    pub responsible_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProcedureStatus,
    pub created_by: Option<i64>,
    pub modified_by: Option<i64>,
    pub last_modified: String,
}

/// 절차 생성 요청. 담당자와 작성자는 요청자 신원에서 가져옵니다.
#[derive(Debug, Deserialize)]
pub struct CreateProcedureRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "super::positive_id")]
    pub subprocess_id: i64,
    /// 없으면 Created. 알 수 없는 값이면 InvalidArgument
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProcedureRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::optional_positive_id")]
    pub subprocess_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachDocumentRequest {
    #[serde(deserialize_with = "super::positive_id")]
    pub document_id: i64,
}

/// 절차에 연결된 문서 (연결 시각과 최신 버전 번호 포함)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProcedureDocument {
    pub document_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub added_at: String,
    pub latest_version: Option<i64>,
}
