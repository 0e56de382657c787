use axum::{extract::State, http::StatusCode, Json};
use deadpool_redis::redis::cmd;
use serde::Serialize;

use crate::api::state::AppState;
use crate::infrastructure::queues;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub redis: String,
    pub pending_ingest_jobs: Option<i64>,
    pub pending_chat_jobs: Option<i64>,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let mut pending_ingest_jobs = None;
    let mut pending_chat_jobs = None;

    let redis_status = match state.redis_pool.get().await {
        Ok(mut conn) => {
            let ping: Result<String, _> = cmd("PING").query_async(&mut *conn).await;
            if ping.is_ok() {
                pending_ingest_jobs = cmd("LLEN")
                    .arg(queues::INGEST_QUEUE)
                    .query_async(&mut *conn)
                    .await
                    .ok();
                pending_chat_jobs = cmd("LLEN")
                    .arg(queues::CHAT_QUEUE)
                    .query_async(&mut *conn)
                    .await
                    .ok();
                "connected"
            } else {
                "disconnected"
            }
        }
        Err(_) => "disconnected",
    };

    let is_ready = redis_status == "connected";

    let response = ReadinessResponse {
        status: if is_ready { "ready" } else { "not_ready" }.into(),
        redis: redis_status.into(),
        pending_ingest_jobs,
        pending_chat_jobs,
    };

    if is_ready {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
