use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::api::routes::jobs::QueuedJobResponse;
use crate::api::state::AppState;
use crate::domain::{Message, RetrievalScope};
use crate::infrastructure::ChatTurnJob;

/// A chat turn must name its retrieval scope explicitly; a request without
/// one is rejected at deserialization rather than silently widened to every
/// document the user owns.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub scope: RetrievalScope,
    pub messages: Vec<Message>,
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<QueuedJobResponse>, StatusCode> {
    if request.user_id.trim().is_empty() || request.messages.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let job = ChatTurnJob::new(request.user_id, request.scope, request.messages);

    let job_id = state.job_producer.push_chat_job(&job).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to queue chat job");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(QueuedJobResponse::queued(job_id)))
}
