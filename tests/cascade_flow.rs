mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{body_json, TestApp};
use procdocs::db;
use procdocs::middleware::auth::AuthUser;
use serde_json::{json, Value};

async fn created(response: axum::response::Response) -> Result<Value> {
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn department_lifecycle_with_cascade_delete() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, admin) = app.admin_token().await?;
    let (head_id, _) = app.user_token("Marta", "user", None).await?;

    let department = created(
        app.post_json(
            "/api/v1/departments",
            &json!({ "name": "Finanzas", "head_id": head_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    let department_id = department["id"].as_i64().expect("department id");
    assert_eq!(department["head_name"], "Marta");

    // 부서장으로 지정된 사용자는 그 부서의 구성원이 됩니다.
    let members = body_json(
        app.get(&format!("/api/v1/departments/{department_id}/members"), Some(&admin))
            .await?,
    )
    .await?;
    assert_eq!(members["members"][0]["id"], head_id);

    let (member_id, member) = app.user_token("Luis", "user", Some(department_id)).await?;

    let busy = created(
        app.post_json(
            "/api/v1/subprocesses",
            &json!({ "name": "Pagos", "department_id": department_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    let busy_id = busy["id"].as_i64().expect("subprocess id");
    created(
        app.post_json(
            "/api/v1/subprocesses",
            &json!({ "name": "Presupuesto", "department_id": department_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;

    let procedure = created(
        app.post_json(
            "/api/v1/procedures",
            &json!({ "title": "Pagar facturas", "subprocess_id": busy_id, "status": "En revisión" }),
            Some(&member),
        )
        .await?,
    )
    .await?;
    let procedure_id = procedure["id"].as_i64().expect("procedure id");
    assert_eq!(procedure["status"], "Under review");
    assert_eq!(procedure["responsible_id"], member_id);

    let document = created(
        app.post_json("/api/v1/documents", &json!({ "name": "Plantilla" }), Some(&member))
            .await?,
    )
    .await?;
    let document_id = document["id"].as_i64().expect("document id");

    let attach_path = format!("/api/v1/procedures/{procedure_id}/documents");
    let response = app
        .post_json(&attach_path, &json!({ "document_id": document_id }), Some(&member))
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .post_json(&attach_path, &json!({ "document_id": document_id }), Some(&member))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["added"], false);

    // 절차가 남아 있는 하위 프로세스는 지울 수 없습니다.
    let response = app.delete(&format!("/api/v1/subprocesses/{busy_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await?["error"]["code"], "has_dependents");

    let stats = body_json(app.get("/api/v1/departments/stats", Some(&admin)).await?).await?;
    assert_eq!(stats["total_departments"], 1);
    assert_eq!(stats["total_heads"], 1);
    assert_eq!(stats["total_procedures"], 1);

    // 관리자가 아니면 부서를 삭제할 수 없습니다.
    let response = app.delete(&format!("/api/v1/departments/{department_id}"), Some(&member)).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.delete(&format!("/api/v1/departments/{department_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await?;
    assert_eq!(report["subprocesses_deleted"], 2);
    assert_eq!(report["procedures_deleted"], 1);
    assert_eq!(report["procedure_links_deleted"], 1);
    assert_eq!(report["users_detached"], 2);

    let response = app.get(&format!("/api/v1/procedures/{procedure_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get(&format!("/api/v1/subprocesses/{busy_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.get(&format!("/api/v1/documents/{document_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::OK);

    for user_id in [head_id, member_id] {
        let user = db::find_by_id(&app.pool, user_id).await?.expect("user survives");
        assert_eq!(user.department_id, None);
    }

    Ok(())
}

#[tokio::test]
async fn procedure_rules_are_enforced() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, admin) = app.admin_token().await?;

    let department = created(
        app.post_json("/api/v1/departments", &json!({ "name": "Calidad" }), Some(&admin))
            .await?,
    )
    .await?;
    let department_id = department["id"].as_i64().expect("department id");
    let subprocess = created(
        app.post_json(
            "/api/v1/subprocesses",
            &json!({ "name": "Auditoría", "department_id": department_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    let subprocess_id = subprocess["id"].as_i64().expect("subprocess id");

    let (owner_id, owner) = app.user_token("Owner", "user", Some(department_id)).await?;
    let (_, outsider) = app.user_token("Outsider", "user", None).await?;

    let response = app
        .post_json(
            "/api/v1/procedures",
            &json!({ "title": "Revisar", "subprocess_id": subprocess_id, "status": "bogus" }),
            Some(&owner),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await?["error"]["code"], "invalid_argument");

    let procedure = created(
        app.post_json(
            "/api/v1/procedures",
            &json!({ "title": "Revisar", "subprocess_id": subprocess_id }),
            Some(&owner),
        )
        .await?,
    )
    .await?;
    let procedure_id = procedure["id"].as_i64().expect("procedure id");
    assert_eq!(procedure["status"], "Created");
    let path = format!("/api/v1/procedures/{procedure_id}");

    let response = app.patch_json(&path, &json!({ "status": "Published" }), Some(&outsider)).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.patch_json(&path, &json!({ "status": "nope" }), Some(&owner)).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.patch_json(&path, &json!({ "title": "Revisar v2" }), Some(&owner)).await?;
    let updated = body_json(response).await?;
    assert_eq!(updated["status"], "Created");
    assert_eq!(updated["modified_by"], owner_id);

    let response = app
        .get(&format!("/api/v1/departments/{department_id}/procedures"), Some(&outsider))
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let listed = body_json(
        app.get(&format!("/api/v1/departments/{department_id}/procedures"), Some(&owner))
            .await?,
    )
    .await?;
    assert_eq!(listed["procedures"].as_array().map(Vec::len), Some(1));

    // 담당자라도 절차 관리 권한이 없으면 삭제할 수 없습니다.
    let response = app.delete(&path, Some(&owner)).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let manager = app.token_for(&AuthUser {
        user_id: owner_id,
        role: "user".to_string(),
        department_id: Some(department_id),
        can_manage_procedures: true,
        is_department_head: false,
    })?;
    let response = app.delete(&path, Some(&manager)).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.delete(&format!("/api/v1/subprocesses/{subprocess_id}"), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    Ok(())
}

async fn assert_invalid_argument(response: axum::response::Response) -> Result<()> {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await?;
    assert_eq!(body["error"]["code"], "invalid_argument");
    assert!(body["error"]["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn body_and_query_ids_are_validated() -> Result<()> {
    let app = TestApp::new().await?;
    let (_, admin) = app.admin_token().await?;

    let department = created(
        app.post_json("/api/v1/departments", &json!({ "name": "Compras" }), Some(&admin))
            .await?,
    )
    .await?;
    let department_id = department["id"].as_i64().expect("department id");
    let subprocess = created(
        app.post_json(
            "/api/v1/subprocesses",
            &json!({ "name": "Licitaciones", "department_id": department_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    let subprocess_id = subprocess["id"].as_i64().expect("subprocess id");
    let procedure = created(
        app.post_json(
            "/api/v1/procedures",
            &json!({ "title": "Evaluar ofertas", "subprocess_id": subprocess_id }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    let procedure_id = procedure["id"].as_i64().expect("procedure id");
    let links = format!("/api/v1/procedures/{procedure_id}/documents");

    assert_invalid_argument(app.post_json(&links, &json!({ "document_id": -5 }), Some(&admin)).await?).await?;
    assert_invalid_argument(app.post_json(&links, &json!({ "document_id": "abc" }), Some(&admin)).await?).await?;
    assert_invalid_argument(app.post_json(&links, &json!({}), Some(&admin)).await?).await?;
    assert_invalid_argument(app.post_json(&links, "not an object", Some(&admin)).await?).await?;

    assert_invalid_argument(
        app.post_json(
            "/api/v1/subprocesses",
            &json!({ "name": "Otro", "department_id": -1 }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    assert_invalid_argument(
        app.post_json(
            "/api/v1/procedures",
            &json!({ "title": "Otro", "subprocess_id": 0 }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    assert_invalid_argument(
        app.patch_json(
            &format!("/api/v1/departments/{department_id}"),
            &json!({ "head_id": "x" }),
            Some(&admin),
        )
        .await?,
    )
    .await?;
    assert_invalid_argument(app.get("/api/v1/subprocesses?department_id=-3", Some(&admin)).await?).await?;

    // 거부된 요청은 아무 것도 바꾸지 않았습니다.
    let listed = body_json(app.get(&links, Some(&admin)).await?).await?;
    assert_eq!(listed["documents"].as_array().map(Vec::len), Some(0));
    let subprocesses = body_json(
        app.get(&format!("/api/v1/subprocesses?department_id={department_id}"), Some(&admin))
            .await?,
    )
    .await?;
    assert_eq!(subprocesses["subprocesses"].as_array().map(Vec::len), Some(1));

    // 양의 정수 ID는 그대로 통과합니다.
    let document = created(
        app.post_json("/api/v1/documents", &json!({ "name": "Pliego" }), Some(&admin))
            .await?,
    )
    .await?;
    let document_id = document["id"].as_i64().expect("document id");
    let response = app.post_json(&links, &json!({ "document_id": document_id }), Some(&admin)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    Ok(())
}
