use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct QueuedJobResponse {
    pub job_id: Uuid,
    pub status: String,
}

impl QueuedJobResponse {
    pub fn queued(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: "queued".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, StatusCode> {
    let result = state
        .job_producer
        .get_job_status(&job_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get job status");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    match result {
        Some(job_result) => Ok(Json(JobStatusResponse {
            job_id: job_result.job_id,
            status: format!("{:?}", job_result.status).to_lowercase(),
            result: job_result.result,
            error: job_result.error,
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}
