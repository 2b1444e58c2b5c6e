//! # procdocs 웹 서버 진입점
//!
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. SQLite 연결 풀 생성과 마이그레이션
//! 4. API 라우터 설정
//! 5. HTTP 서버 시작

use anyhow::{Context, Result}; // anyhow: 바이너리 경계에서만 쓰는 범용 에러 타입
use procdocs::{
    config::Config,
    db,
    routes::{self, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅 초기화 ──
    // RUST_LOG가 없으면 procdocs, tower_http, axum을 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procdocs=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 ──
    let config = Config::from_env().context("DATABASE_URL and JWT_SECRET must be set")?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        max_upload_bytes = config.max_upload_bytes,
        "starting procdocs server"
    );

    // ── 4단계: SQLite 연결 풀 생성 + 마이그레이션 ──
    let pool = db::connect(&config.database_url, config.db_max_connections).await?;
    db::migrate(&pool).await?;
    tracing::info!("database migrations applied");

    // ── 5단계: 라우터 설정 ──
    let state = AppState {
        pool,
        jwt_secret: config.jwt_secret.clone(),
        max_upload_bytes: config.max_upload_bytes,
    };
    let cors = routes::cors_layer(config.cors_allowed_origin.as_deref());
    let app = routes::create_router(state, cors);

    // ── 6단계: 서버 시작 ──
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
