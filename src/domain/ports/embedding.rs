use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds one non-blank text. Callers filter out blank chunks before
    /// calling; the returned vector always has `dimension()` entries or the
    /// call fails with `DimensionMismatch`.
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    fn dimension(&self) -> usize;
}
