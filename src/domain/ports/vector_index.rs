use crate::domain::{errors::DomainError, ChunkFilter, ChunkPoint, Embedding, ScoredChunk};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Writes one batch of points in a single provider call. Upserts are
    /// idempotent by point id: writing the same id twice replaces the prior
    /// entry. Callers cap batches at the provider limit and issue calls
    /// sequentially.
    async fn upsert(&self, points: &[ChunkPoint]) -> Result<(), DomainError>;

    /// Returns up to `top_k` nearest chunks under `filter`, best score first.
    async fn query(
        &self,
        embedding: &Embedding,
        filter: &ChunkFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError>;

    /// Removes every chunk of one document. Both conditions are ANDed so a
    /// caller can never delete another user's vectors.
    async fn delete_by_file(&self, file_id: &str, user_id: &str) -> Result<(), DomainError>;
}
