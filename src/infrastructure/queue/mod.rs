mod jobs;

pub use jobs::{
    keys, queues, ChatTurnJob, IngestDocumentJob, JobResult, QueueJobStatus, RESULT_TTL_SECONDS,
};
