use std::sync::Arc;

use tracing::{instrument, warn};

use crate::domain::{
    ports::{EmbeddingService, VectorIndex},
    ChunkFilter, DomainError, Embedding, RetrievalScope, ScoredChunk,
};

/// What one scoped retrieval pass produced. Chunks accumulate in
/// target-iteration order; similarity order holds within one target's
/// results only.
#[derive(Debug, Default)]
pub struct ScopeRetrieval {
    pub chunks: Vec<ScoredChunk>,
    pub files_searched: usize,
    pub files_with_hits: usize,
}

/// Similarity search over the vector index, always under a user-scoped
/// metadata filter.
pub struct RetrievalService {
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl RetrievalService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        Self {
            embedding,
            index,
            top_k,
        }
    }

    /// One direct query. Errors propagate: this backs the synchronous
    /// search endpoint where the caller must see failures.
    #[instrument(skip(self, query))]
    pub async fn search(
        &self,
        query: &str,
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        self.index.query(&embedding, filter, limit).await
    }

    /// Context retrieval for one chat turn. The query text is embedded once
    /// and the index is queried per target file (folder scope queries carry
    /// the folder-wide filter). Failures here never abort the chat turn:
    /// they degrade to fewer or no context chunks.
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn retrieve_for_scope(
        &self,
        query: &str,
        scope: &RetrievalScope,
        user_id: &str,
    ) -> ScopeRetrieval {
        let embedding = match self.embedding.embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "query embedding failed, proceeding without context");
                return ScopeRetrieval::default();
            }
        };

        let mut retrieval = ScopeRetrieval::default();

        match scope {
            RetrievalScope::File { file_id } => {
                retrieval.files_searched = 1;
                self.query_target(
                    &embedding,
                    &ChunkFilter::for_file(user_id, file_id),
                    file_id,
                    &mut retrieval,
                )
                .await;
            }
            RetrievalScope::Folder {
                folder_id,
                file_ids,
            } => {
                let filter = ChunkFilter::for_folder(user_id, folder_id);
                for file_id in file_ids {
                    retrieval.files_searched += 1;
                    self.query_target(&embedding, &filter, file_id, &mut retrieval)
                        .await;
                }
            }
            RetrievalScope::AllDocuments => {
                retrieval.files_searched = 1;
                self.query_target(
                    &embedding,
                    &ChunkFilter::for_user(user_id),
                    "all-documents",
                    &mut retrieval,
                )
                .await;
            }
        }

        retrieval
    }

    async fn query_target(
        &self,
        embedding: &Embedding,
        filter: &ChunkFilter,
        target: &str,
        retrieval: &mut ScopeRetrieval,
    ) {
        match self.index.query(embedding, filter, self.top_k).await {
            Ok(chunks) => {
                if !chunks.is_empty() {
                    retrieval.files_with_hits += 1;
                    retrieval.chunks.extend(chunks);
                }
            }
            Err(e) => {
                warn!(target_file = target, error = %e, "retrieval failed for target, continuing");
            }
        }
    }
}
