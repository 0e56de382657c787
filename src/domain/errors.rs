use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Document contains no extractable text")]
    NoTextContent,

    #[error("Embedding dimension mismatch: got {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding provider error: {0}")]
    EmbeddingProvider(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Chat provider error: {0}")]
    ChatProvider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn unsupported_file_type(ext: impl Into<String>) -> Self {
        Self::UnsupportedFileType(ext.into())
    }

    pub fn extraction_failed(msg: impl Into<String>) -> Self {
        Self::ExtractionFailed(msg.into())
    }

    pub fn embedding_provider(msg: impl Into<String>) -> Self {
        Self::EmbeddingProvider(msg.into())
    }

    pub fn vector_store(msg: impl Into<String>) -> Self {
        Self::VectorStore(msg.into())
    }

    pub fn chat_provider(msg: impl Into<String>) -> Self {
        Self::ChatProvider(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
