//! Application layer - use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! provider clients, so the whole pipeline runs against fakes in tests.

pub mod services;

pub use services::{
    ChatOutcome, ChatService, IngestionReport, IngestionService, RetrievalService, ScopeRetrieval,
};
