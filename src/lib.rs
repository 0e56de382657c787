//! Backend core of a document-chat product: ingestion of uploaded
//! documents into a vector index and retrieval-grounded chat over them.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
