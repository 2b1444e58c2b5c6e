//! # 콘텐츠 협상(Content Negotiation)
//!
//! 저장된 버전을 돌려줄 때 필요한 메타데이터를 결정합니다.
//! - 다운로드 파일명: 표시 이름을 정리하고 MIME 타입에 맞는 확장자를 붙임
//! - `Content-Type`: MIME 타입이 없으면 `application/octet-stream`
//! - `Content-Disposition`: inline(브라우저 표시) / attachment(다운로드),
//!   구형 브라우저용 `filename="..."`과 UTF-8 퍼센트 인코딩 `filename*=`을 함께 보냄
//!
//! HTTP 타입에 의존하지 않는 순수 함수들이며, 헤더 조립은 라우트 계층이 합니다.

use crate::models::{DocumentVersion, FileKind};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 5987 attr-char 중 그대로 둘 문자를 제외한 나머지를 인코딩합니다.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 헤더에 넣으면 안 되는 파일명 문자
const FORBIDDEN_FILENAME_CHARS: [char; 11] =
    ['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\r', '\n'];

const FALLBACK_FILENAME: &str = "archivo";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 브라우저 안에서 바로 표시
    Inline,
    /// 파일로 내려받기
    Attachment,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHeaders {
    pub content_type: String,
    pub content_disposition: String,
    /// 실제 바이트 길이 (추정값이 아님)
    pub content_length: u64,
    /// 바이트의 SHA-256 해시를 따옴표로 감싼 강한 ETag
    pub etag: String,
}

/// 다운로드 파일명을 결정합니다.
///
/// 기본 이름은 상위 문서의 표시 이름, 없으면 `documento_v<번호>`입니다.
/// 금지 문자를 지우고 양끝 공백을 자른 뒤 비었으면 `archivo`를 씁니다.
/// MIME 타입을 알아볼 수 있으면 이름이 무엇으로 끝나든 표준 확장자를 붙입니다.
pub fn resolve_download_name(version: &DocumentVersion) -> String {
    let raw_base = version
        .document_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("documento_v{}", version.version_number));

    let cleaned: String = raw_base
        .chars()
        .filter(|ch| !FORBIDDEN_FILENAME_CHARS.contains(ch))
        .collect();
    let base = match cleaned.trim() {
        "" => FALLBACK_FILENAME,
        trimmed => trimmed,
    };

    let extension = version
        .mime_type
        .as_deref()
        .and_then(FileKind::from_mime)
        .map(FileKind::extension)
        .unwrap_or("");

    format!("{}{}", base, extension)
}

/// 버전을 응답으로 보낼 때의 헤더 값을 만듭니다.
pub fn build_content_headers(version: &DocumentVersion, disposition: Disposition) -> ContentHeaders {
    let content_type = version
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let filename = resolve_download_name(version);

    ContentHeaders {
        content_type,
        content_disposition: content_disposition(disposition, &filename),
        content_length: version.file_bytes.len() as u64,
        etag: format!("\"{}\"", version.content_hash),
    }
}

/// `inline; filename="plain"; filename*=UTF-8''encoded`
///
/// `filename=`에는 ASCII만 남기고(나머지는 `_`), 원래 이름은 `filename*=`에 인코딩해 담습니다.
fn content_disposition(disposition: Disposition, filename: &str) -> String {
    let plain: String = filename
        .chars()
        .map(|ch| if ch.is_ascii_graphic() || ch == ' ' { ch } else { '_' })
        .collect();
    let encoded = utf8_percent_encode(filename, FILENAME_ENCODE_SET);

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition.as_str(),
        plain,
        encoded
    )
}
