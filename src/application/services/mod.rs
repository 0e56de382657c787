pub mod chat;
pub mod ingestion;
pub mod retrieval;

pub use chat::{ChatOutcome, ChatService};
pub use ingestion::{IngestionReport, IngestionService};
pub use retrieval::{RetrievalService, ScopeRetrieval};
