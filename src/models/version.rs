//! # 문서 버전 모델 정의
//!
//! 버전은 한 번 만들어지면 바뀌지 않습니다. 새 업로드는 항상 새 버전을 추가합니다.
//!
//! - `DocumentVersion`: 파일 바이트를 포함한 단일 버전 (다운로드용)
//! - `DocumentVersionSummary`: 바이트를 뺀 메타데이터 (목록용)
//! - `NewVersion`: 수집 계층이 넘겨주는 업로드 한 건
//! - `FileKind`: 허용되는 파일 형식 (PDF, DOC, DOCX, JPEG, PNG, BMP, WEBP)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersion {
    pub id: i64,
    pub document_id: i64,
    /// 상위 문서의 표시 이름 (다운로드 파일명에 사용)
    pub document_name: Option<String>,
    pub version_number: i64,
    #[serde(skip_serializing, default)]
    pub file_bytes: Vec<u8>,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub content_hash: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentVersionSummary {
    pub id: i64,
    pub document_id: i64,
    pub version_number: i64,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub content_hash: String,
    pub uploaded_by: Option<i64>,
    pub uploaded_at: String,
}

/// 업로드 한 건. multipart 파싱은 라우트 계층이 끝낸 상태로 들어옵니다.
#[derive(Debug, Clone, Default)]
pub struct NewVersion {
    pub bytes: Vec<u8>,
    /// 클라이언트가 선언한 MIME 타입
    pub mime_type: Option<String>,
    /// 원본 파일명. MIME 타입이 허용 목록에 없을 때 확장자로 판별합니다.
    pub file_name: Option<String>,
    pub uploaded_by: Option<i64>,
}

/// 추가된 버전의 식별 정보
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppendedVersion {
    pub version_id: i64,
    pub version_number: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Doc,
    Docx,
    Jpeg,
    Png,
    Bmp,
    Webp,
}

impl FileKind {
    /// MIME 타입으로 형식을 판별합니다. `; charset=...` 같은 파라미터는 무시합니다.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Some(FileKind::Pdf),
            "application/msword" => Some(FileKind::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            "image/jpeg" | "image/jpg" => Some(FileKind::Jpeg),
            "image/png" => Some(FileKind::Png),
            "image/bmp" => Some(FileKind::Bmp),
            "image/webp" => Some(FileKind::Webp),
            _ => None,
        }
    }

    /// 파일명의 확장자로 형식을 판별합니다 (mime_guess 사용).
    pub fn from_file_name(name: &str) -> Option<Self> {
        mime_guess::from_path(name)
            .iter_raw()
            .find_map(FileKind::from_mime)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Doc => "application/msword",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
            FileKind::Bmp => "image/bmp",
            FileKind::Webp => "image/webp",
        }
    }

    /// 다운로드 파일명에 붙이는 표준 확장자 (점 포함)
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Doc => ".doc",
            FileKind::Docx => ".docx",
            FileKind::Jpeg => ".jpg",
            FileKind::Png => ".png",
            FileKind::Bmp => ".bmp",
            FileKind::Webp => ".webp",
        }
    }
}
