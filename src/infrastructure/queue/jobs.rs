use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Message, RetrievalScope};

pub const RESULT_TTL_SECONDS: u64 = 3600;

pub mod queues {
    pub const CHAT_QUEUE: &str = "jobs:chat";
    pub const INGEST_QUEUE: &str = "jobs:ingest";
}

pub mod keys {
    use uuid::Uuid;

    pub fn job_status(job_id: &Uuid) -> String {
        format!("job:status:{}", job_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub status: QueueJobStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobResult {
    pub fn pending(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Pending,
            result: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn processing(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Processing,
            result: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn completed(job_id: Uuid, result: serde_json::Value) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Completed,
            result: Some(result),
            error: None,
            completed_at: Some(Utc::now()),
        }
    }

    pub fn failed(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Failed,
            result: None,
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
        }
    }
}

/// One uploaded document queued for ingestion. The raw bytes travel inside
/// the payload base64-encoded; ownership and folder placement are fixed
/// here and stamped onto every chunk the pipeline produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDocumentJob {
    pub job_id: Uuid,
    pub file_id: String,
    pub file_name: String,
    pub extension: String,
    pub user_id: String,
    pub folder_id: Option<String>,
    pub data: String,
}

impl IngestDocumentJob {
    pub fn new(
        file_id: impl Into<String>,
        file_name: impl Into<String>,
        extension: impl Into<String>,
        user_id: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            file_id: file_id.into(),
            file_name: file_name.into(),
            extension: extension.into(),
            user_id: user_id.into(),
            folder_id: None,
            data: data.into(),
        }
    }

    pub fn with_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }
}

/// One chat turn queued for grounded completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnJob {
    pub job_id: Uuid,
    pub user_id: String,
    pub scope: RetrievalScope,
    pub messages: Vec<Message>,
}

impl ChatTurnJob {
    pub fn new(user_id: impl Into<String>, scope: RetrievalScope, messages: Vec<Message>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            user_id: user_id.into(),
            scope,
            messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageRole;

    #[test]
    fn test_ingest_job_round_trips() {
        let job = IngestDocumentJob::new("file-1", "report.pdf", "pdf", "user-1", "AAEC")
            .with_folder("folder-7");

        let json = serde_json::to_string(&job).unwrap();
        let back: IngestDocumentJob = serde_json::from_str(&json).unwrap();

        assert_eq!(back.job_id, job.job_id);
        assert_eq!(back.file_id, "file-1");
        assert_eq!(back.folder_id.as_deref(), Some("folder-7"));
        assert_eq!(back.data, "AAEC");
    }

    #[test]
    fn test_chat_job_round_trips_scope() {
        let job = ChatTurnJob::new(
            "user-1",
            RetrievalScope::folder("folder-1", vec!["a".into(), "b".into()]),
            vec![Message::new(MessageRole::User, "what is this about?")],
        );

        let json = serde_json::to_string(&job).unwrap();
        let back: ChatTurnJob = serde_json::from_str(&json).unwrap();

        assert!(
            matches!(back.scope, RetrievalScope::Folder { ref file_ids, .. } if file_ids.len() == 2)
        );
        assert_eq!(back.messages.len(), 1);
    }

    #[test]
    fn test_job_result_states() {
        let id = Uuid::new_v4();

        let pending = JobResult::pending(id);
        assert_eq!(pending.status, QueueJobStatus::Pending);
        assert!(pending.completed_at.is_none());

        let done = JobResult::completed(id, serde_json::json!({"chunks_indexed": 3}));
        assert_eq!(done.status, QueueJobStatus::Completed);
        assert!(done.completed_at.is_some());

        let failed = JobResult::failed(id, "boom");
        assert_eq!(failed.status, QueueJobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
