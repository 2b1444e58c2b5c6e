//! # 데이터 모델 모듈
//!
//! 애플리케이션에서 사용하는 데이터 구조체(struct)들을 정의합니다.
//! - `department`: 부서와 통계
//! - `document`: 문서 메타데이터
//! - `procedure`: 절차와 닫힌 상태 열거형 `ProcedureStatus`
//! - `subprocess`: 하위 프로세스
//! - `user`: 부서 구성원
//! - `version`: 문서 버전과 허용 파일 형식 `FileKind`
//!
//! 식별자는 모두 양의 정수입니다. URL 경로에서 들어온 문자열은 `parse_id`로,
//! 요청 본문과 쿼리의 식별자 필드는 `positive_id` 계열 역직렬화 함수로 검증합니다.

pub mod department;
pub mod document;
pub mod procedure;
pub mod subprocess;
pub mod user;
pub mod version;

pub use department::*;
pub use document::*;
pub use procedure::*;
pub use subprocess::*;
pub use user::*;
pub use version::*;

use crate::error::AppError;
use serde::{Deserialize, Deserializer};

/// 경로 파라미터로 받은 식별자를 양의 정수로 변환합니다.
///
/// 숫자가 아니거나 0 이하이면 패닉 대신 `InvalidArgument`를 반환합니다.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidArgument(format!(
            "'{}' is not a valid identifier",
            raw
        ))),
    }
}

/// 본문/쿼리 식별자. 0 이하이면 역직렬화 단계에서 거부됩니다.
#[derive(Deserialize)]
#[serde(try_from = "i64")]
struct PositiveId(i64);

impl TryFrom<i64> for PositiveId {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value > 0 {
            Ok(PositiveId(value))
        } else {
            Err(format!("'{}' is not a valid identifier", value))
        }
    }
}

/// `#[serde(deserialize_with = "positive_id")]`: 필수 식별자 필드
pub fn positive_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    PositiveId::deserialize(deserializer).map(|id| id.0)
}

/// 선택 식별자 필드. `#[serde(default)]`와 함께 사용합니다.
pub fn optional_positive_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<PositiveId>::deserialize(deserializer).map(|id| id.map(|id| id.0))
}

/// `double_option`과 같지만 값이 있으면 양의 식별자여야 합니다.
pub fn double_option_id<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    optional_positive_id(deserializer).map(Some)
}

/// PATCH 본문에서 "필드 누락"과 "명시적 null"을 구분하기 위한 역직렬화 함수.
///
/// `#[serde(default, deserialize_with = "double_option")]`와 함께 사용합니다.
/// None = 필드 누락 (변경 안 함), Some(None) = null (값 제거), Some(Some(v)) = 값 지정
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
