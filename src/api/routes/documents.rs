use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::api::routes::jobs::QueuedJobResponse;
use crate::api::state::AppState;
use crate::domain::{ChunkFilter, FileKind};
use crate::infrastructure::IngestDocumentJob;

const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Accepts one uploaded document and queues it for ingestion.
///
/// Multipart fields: `file` (with filename), `file_id` (the document
/// identity assigned by the upstream store), `user_id`, optional
/// `folder_id`. The extension is validated here, before any byte leaves
/// the process.
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QueuedJobResponse>, StatusCode> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut file_id: Option<String> = None;
    let mut user_id: Option<String> = None;
    let mut folder_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        match field.name() {
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|_| StatusCode::BAD_REQUEST)?
                        .to_vec(),
                );
            }
            Some("file_id") => {
                file_id = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("user_id") => {
                user_id = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("folder_id") => {
                let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                if !value.trim().is_empty() {
                    folder_id = Some(value);
                }
            }
            _ => {}
        }
    }

    let (Some(bytes), Some(name), Some(file_id), Some(user_id)) =
        (file_bytes, file_name, file_id, user_id)
    else {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    };

    let extension = std::path::Path::new(&name)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or(StatusCode::UNPROCESSABLE_ENTITY)?
        .to_string();

    if let Err(e) = FileKind::from_extension(&extension) {
        tracing::warn!(file_id = %file_id, error = %e, "rejected upload");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let mut job = IngestDocumentJob::new(file_id, name, extension, user_id, BASE64.encode(&bytes));
    if let Some(folder) = folder_id {
        job = job.with_folder(folder);
    }

    let job_id = state
        .job_producer
        .push_ingest_job(&job)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to queue ingest job");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(QueuedJobResponse::queued(job_id)))
}

#[derive(Debug, Deserialize)]
pub struct SearchDocumentsRequest {
    pub query: String,
    pub user_id: String,
    pub file_id: Option<String>,
    pub folder_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub file_id: String,
    pub page: usize,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchDocumentsRequest>,
) -> Result<Json<Vec<SearchResultResponse>>, StatusCode> {
    if request.user_id.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let filter = if let Some(folder_id) = &request.folder_id {
        ChunkFilter::for_folder(&request.user_id, folder_id)
    } else if let Some(file_id) = &request.file_id {
        ChunkFilter::for_file(&request.user_id, file_id)
    } else {
        ChunkFilter::for_user(&request.user_id)
    };

    let limit = request.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match state.retrieval.search(&request.query, &filter, limit).await {
        Ok(results) => Ok(Json(
            results
                .into_iter()
                .map(|r| SearchResultResponse {
                    file_id: r.metadata.file_id,
                    page: r.metadata.page,
                    chunk_index: r.metadata.chunk_index,
                    text: r.metadata.text,
                    score: r.score,
                })
                .collect(),
        )),
        Err(e) => {
            tracing::error!(error = %e, "Search failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteDocumentQuery {
    pub user_id: String,
}

/// Removes every vector belonging to one document. Invoked by the upstream
/// document store when the document itself is deleted.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(query): Query<DeleteDocumentQuery>,
) -> Result<StatusCode, StatusCode> {
    if query.user_id.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    match state
        .vector_index
        .delete_by_file(&file_id, &query.user_id)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            tracing::error!(error = %e, file_id, "Failed to delete document vectors");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
