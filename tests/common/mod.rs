use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use procdocs::db;
use procdocs::middleware::auth::{create_access_token, AuthUser, ADMIN_ROLE};
use procdocs::models::CreateUserRequest;
use procdocs::routes::{self, AppState};
use serde::Serialize;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const JWT_SECRET: &str = "test-secret";
pub const MAX_UPLOAD_BYTES: usize = 1024;

const BOUNDARY: &str = "procdocs-test-boundary";

pub struct TestApp {
    pub pool: SqlitePool,
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create temp dir")?;
        let url = format!("sqlite:{}", dir.path().join("procdocs.db").display());
        let pool = db::connect(&url, 5).await?;
        db::migrate(&pool).await?;

        let state = AppState {
            pool: pool.clone(),
            jwt_secret: JWT_SECRET.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };
        let router = routes::create_router(state, routes::cors_layer(None));

        Ok(Self {
            pool,
            router,
            _dir: dir,
        })
    }

    /// 사용자를 만들고 그 신원으로 서명된 토큰을 돌려줍니다.
    pub async fn user_token(&self, name: &str, role: &str, department_id: Option<i64>) -> Result<(i64, String)> {
        let user = db::create_user(
            &self.pool,
            &CreateUserRequest {
                name: name.to_string(),
                email: None,
                role: Some(role.to_string()),
                department_id,
            },
        )
        .await?;

        let identity = AuthUser {
            user_id: user.id,
            role: role.to_string(),
            department_id,
            can_manage_procedures: false,
            is_department_head: false,
        };
        Ok((user.id, create_access_token(&identity, JWT_SECRET)?))
    }

    #[allow(dead_code)]
    pub async fn admin_token(&self) -> Result<(i64, String)> {
        self.user_token("Admin", ADMIN_ROLE, None).await
    }

    #[allow(dead_code)]
    pub fn token_for(&self, identity: &AuthUser) -> Result<String> {
        Ok(create_access_token(identity, JWT_SECRET)?)
    }

    async fn send(&self, request: Request<Body>) -> Result<Response> {
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    fn builder(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match token {
            Some(token) => builder.header("authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Response> {
        let request = Self::builder(Method::GET, path, token).body(Body::empty())?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<Response> {
        let request = Self::builder(Method::DELETE, path, token).body(Body::empty())?;
        self.send(request).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<Response> {
        let request = Self::builder(Method::POST, path, token)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(payload)?))?;
        self.send(request).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<Response> {
        let request = Self::builder(Method::PATCH, path, token)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(payload)?))?;
        self.send(request).await
    }

    /// `file` 필드 하나짜리 multipart 본문을 업로드합니다.
    #[allow(dead_code)]
    pub async fn upload(
        &self,
        path: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
        token: &str,
    ) -> Result<Response> {
        let mut body = Vec::new();
        body.extend(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend(data);
        body.extend(b"\r\n");
        body.extend(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Self::builder(Method::POST, path, Some(token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))?;
        self.send(request).await
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body.collect().await.context("failed to read body")?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_json(response: Response) -> Result<serde_json::Value> {
    let bytes = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
