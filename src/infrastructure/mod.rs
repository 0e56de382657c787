pub mod config;
pub mod embedding;
pub mod extract;
pub mod llm;
pub mod queue;
pub mod vector_store;

pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::OpenAiEmbedding;
pub use extract::DocumentTextExtractor;
pub use llm::OpenAiChatModel;
pub use queue::{
    keys, queues, ChatTurnJob, IngestDocumentJob, JobResult, QueueJobStatus, RESULT_TTL_SECONDS,
};
pub use vector_store::{InMemoryVectorIndex, QdrantVectorIndex};
