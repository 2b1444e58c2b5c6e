mod common;

use anyhow::Result;
use axum::http::{header, StatusCode};
use common::{body_json, body_to_vec, TestApp, MAX_UPLOAD_BYTES};
use procdocs::services::versioning::content_hash;
use serde_json::json;

async fn create_document(app: &TestApp, token: &str, name: &str) -> Result<i64> {
    let response = app
        .post_json("/api/v1/documents", &json!({ "name": name }), Some(token))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await?;
    assert!(body["latest_version"].is_null());
    Ok(body["id"].as_i64().expect("document id"))
}

#[tokio::test]
async fn upload_list_and_download_versions() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, token) = app.user_token("Ana", "user", None).await?;
    let id = create_document(&app, &token, "Acta de reunión").await?;

    let first = app
        .upload(&format!("/api/v1/documents/{id}/versions"), "acta.pdf", "application/pdf", b"%PDF-1.7 one", &token)
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await?;
    assert_eq!(first["version_number"], 1);

    let second_bytes: &[u8] = b"%PDF-1.7 two";
    let second = app
        .upload(&format!("/api/v1/documents/{id}/versions"), "acta-v2.pdf", "application/pdf", second_bytes, &token)
        .await?;
    let second = body_json(second).await?;
    assert_eq!(second["version_number"], 2);

    let listed = body_json(app.get(&format!("/api/v1/documents/{id}/versions"), Some(&token)).await?).await?;
    let numbers: Vec<i64> = listed["versions"]
        .as_array()
        .expect("versions array")
        .iter()
        .map(|v| v["version_number"].as_i64().unwrap_or_default())
        .collect();
    assert_eq!(numbers, vec![2, 1]);
    assert!(listed["versions"][0].get("file_bytes").is_none());

    let document = body_json(app.get(&format!("/api/v1/documents/{id}"), Some(&token)).await?).await?;
    assert_eq!(document["latest_version"], 2);

    let download = app.get(&format!("/api/v1/documents/{id}/download"), Some(&token)).await?;
    assert_eq!(download.status(), StatusCode::OK);
    let headers = download.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Acta de reuni_n.pdf\"; filename*=UTF-8''Acta%20de%20reuni%C3%B3n.pdf"
    );
    assert_eq!(headers[header::CONTENT_LENGTH], second_bytes.len().to_string().as_str());
    assert_eq!(
        headers[header::ETAG],
        format!("\"{}\"", content_hash(second_bytes)).as_str()
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        "Content-Disposition, Content-Type, Content-Length, ETag"
    );
    assert_eq!(body_to_vec(download.into_body()).await?, second_bytes);

    let view = app.get(&format!("/api/v1/documents/{id}/view"), Some(&token)).await?;
    assert!(view.headers()[header::CONTENT_DISPOSITION]
        .to_str()?
        .starts_with("inline;"));

    let first_id = first["version_id"].as_i64().expect("version id");
    let old = app.get(&format!("/api/v1/versions/{first_id}/download"), Some(&token)).await?;
    assert_eq!(old.status(), StatusCode::OK);
    assert_eq!(body_to_vec(old.into_body()).await?, b"%PDF-1.7 one");

    Ok(())
}

#[tokio::test]
async fn rejected_uploads_leave_the_chain_untouched() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, token) = app.user_token("Ana", "user", None).await?;
    let id = create_document(&app, &token, "Foto").await?;
    let path = format!("/api/v1/documents/{id}/versions");

    let oversize = vec![0u8; MAX_UPLOAD_BYTES + 1];
    let response = app.upload(&path, "big.png", "image/png", &oversize, &token).await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await?["error"]["code"], "file_too_large");

    let response = app.upload(&path, "archive.zip", "application/zip", b"PK", &token).await?;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await?["error"]["code"], "invalid_file_type");

    let response = app.get(&format!("/api/v1/documents/{id}/download"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 선언된 타입이 없어도 확장자가 허용되면 받아들이고 표준 MIME으로 저장합니다.
    let response = app
        .upload(&path, "informe.docx", "application/octet-stream", b"PK docx", &token)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await?["version_number"], 1);

    let download = app.get(&format!("/api/v1/documents/{id}/download"), Some(&token)).await?;
    let content_type = download.headers()[header::CONTENT_TYPE].to_str()?.to_string();
    assert!(content_type.contains("wordprocessingml"));

    Ok(())
}

#[tokio::test]
async fn identity_and_identifier_errors() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, token) = app.user_token("Ana", "user", None).await?;

    let response = app.get("/api/v1/documents", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await?["error"]["code"], "missing_token");

    let response = app.get("/api/v1/documents", Some("not-a-jwt")).await?;
    assert_eq!(body_json(response).await?["error"]["code"], "invalid_token");

    let response = app.get("/api/v1/documents/abc", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["error"]["code"], "invalid_argument");

    let response = app.get("/api/v1/documents/999/download", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/v1/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn deleting_a_document_removes_its_versions() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, token) = app.user_token("Ana", "user", None).await?;
    let id = create_document(&app, &token, "Plan").await?;
    let path = format!("/api/v1/documents/{id}/versions");
    app.upload(&path, "a.png", "image/png", b"png-1", &token).await?;
    let uploaded = body_json(app.upload(&path, "b.png", "image/png", b"png-2", &token).await?).await?;
    let version_id = uploaded["version_id"].as_i64().expect("version id");

    let response = app.delete(&format!("/api/v1/documents/{id}"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["versions_deleted"], 2);

    let response = app.get(&format!("/api/v1/versions/{version_id}/download"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get(&format!("/api/v1/documents/{id}"), Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
