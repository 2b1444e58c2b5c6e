//! # 헬스체크(Health Check) 핸들러
//!
//! ## 엔드포인트
//! - `GET /api/v1/health` → `{ "status": "ok", "database": "ok" }`
//!
//! 인증 없이 호출할 수 있습니다. 저장소에 닿지 못해도 프로세스는 살아 있으므로
//! `status`는 항상 `ok`이고, 저장소 상태는 `database` 필드로 따로 알려줍니다.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach the database");
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database
    }))
}
