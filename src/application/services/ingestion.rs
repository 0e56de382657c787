use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::{
    chunk_id, stored_text_prefix,
    ports::{EmbeddingService, TextExtractor, VectorIndex},
    ChunkMetadata, ChunkPoint, DomainError, FileKind, TextSplitter,
};
use crate::infrastructure::config::ChunkingConfig;

/// Provider limit on points per upsert call; larger batches are issued as
/// multiple sequential calls.
const UPSERT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub file_id: String,
    pub pages: usize,
    pub chunks_indexed: usize,
}

/// Drives one uploaded document through extraction, chunking, embedding and
/// indexing. Holds no state between calls; every chunk it writes carries the
/// ownership and folder placement it was given.
pub struct IngestionService {
    extractor: Arc<dyn TextExtractor>,
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    splitter: TextSplitter,
    stored_text_limit: usize,
}

impl IngestionService {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        config: &ChunkingConfig,
    ) -> Self {
        Self {
            extractor,
            embedding,
            index,
            splitter: TextSplitter::new(config.chunk_size, config.chunk_overlap),
            stored_text_limit: config.stored_text_limit,
        }
    }

    /// Ingests one document.
    ///
    /// The extension is validated before any extraction or network call. An
    /// embedding or upsert failure aborts the remaining batches; chunks
    /// already upserted stay in the index (ids are stable, so a retry
    /// overwrites them) and the error surfaces to the caller.
    #[instrument(skip(self, data), fields(file_id = %file_id, bytes = data.len()))]
    pub async fn ingest(
        &self,
        file_id: &str,
        extension: &str,
        data: &[u8],
        user_id: &str,
        folder_id: Option<&str>,
    ) -> Result<IngestionReport, DomainError> {
        let kind = FileKind::from_extension(extension)?;

        let pages = self.extractor.extract_pages(data, kind).await?;

        let mut pending: Vec<(usize, usize, String)> = Vec::new();
        for (page_idx, page_text) in pages.iter().enumerate() {
            let chunks = self.splitter.split(page_text);
            for (chunk_idx, chunk) in chunks.into_iter().enumerate() {
                pending.push((page_idx + 1, chunk_idx + 1, chunk));
            }
        }

        if pending.is_empty() {
            return Err(DomainError::NoTextContent);
        }

        let expected_dimension = self.embedding.dimension();
        let total = pending.len();
        let mut indexed = 0;

        for batch in pending.chunks(UPSERT_BATCH_SIZE) {
            let mut points = Vec::with_capacity(batch.len());
            for (page, chunk_index, text) in batch {
                let embedding = self.embedding.embed(text).await?;
                embedding.ensure_dimension(expected_dimension)?;

                points.push(ChunkPoint {
                    id: chunk_id(file_id, *page, *chunk_index),
                    embedding,
                    metadata: ChunkMetadata {
                        file_id: file_id.to_string(),
                        page: *page,
                        chunk_index: *chunk_index,
                        text: stored_text_prefix(text, self.stored_text_limit),
                        user_id: user_id.to_string(),
                        folder_id: folder_id.map(str::to_string),
                    },
                });
            }

            self.index.upsert(&points).await?;
            indexed += points.len();
            debug!(indexed, total, "upserted chunk batch");
        }

        Ok(IngestionReport {
            file_id: file_id.to_string(),
            pages: pages.len(),
            chunks_indexed: indexed,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::{
        ports::{EmbeddingService, TextExtractor},
        DomainError, Embedding, FileKind,
    };

    /// Extractor stub returning a fixed page sequence.
    pub struct FixedPagesExtractor {
        pub pages: Vec<String>,
    }

    #[async_trait]
    impl TextExtractor for FixedPagesExtractor {
        async fn extract_pages(
            &self,
            _data: &[u8],
            _kind: FileKind,
        ) -> Result<Vec<String>, DomainError> {
            Ok(self.pages.clone())
        }
    }

    /// Deterministic embedder: the vector depends only on the text, and
    /// every call is counted so tests can assert that no provider call
    /// happens on a rejected upload.
    pub struct CountingEmbedder {
        dimension: usize,
        emit_dimension: usize,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        pub fn new(dimension: usize) -> Self {
            Self {
                dimension,
                emit_dimension: dimension,
                calls: AtomicUsize::new(0),
            }
        }

        /// Misbehaving variant that reports `dimension` but emits vectors of
        /// a different length.
        pub fn with_wrong_output(dimension: usize, emit_dimension: usize) -> Self {
            Self {
                dimension,
                emit_dimension,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
            let mut vector = vec![0.0f32; dimension];
            for (i, byte) in text.bytes().enumerate() {
                vector[i % dimension] += f32::from(byte) / 255.0;
            }
            vector
        }
    }

    #[async_trait]
    impl EmbeddingService for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Embedding::new(Self::vector_for(text, self.emit_dimension)))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }
}
