use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI embedding client. The provider client is constructed once at
/// startup and injected, never re-read from the environment per call.
pub struct OpenAiEmbedding {
    client: openai::Client,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    pub fn new(client: openai::Client, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    pub fn from_config(client: openai::Client, config: &EmbeddingConfig) -> Self {
        Self::new(client, config.model.clone(), config.dimension)
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let model = self.client.embedding_model(&self.model);

        let embeddings = EmbeddingsBuilder::new(model)
            .document(text)
            .map_err(|e| DomainError::embedding_provider(e.to_string()))?
            .build()
            .await
            .map_err(|e| DomainError::embedding_provider(e.to_string()))?;

        let embedding = embeddings
            .into_iter()
            .next()
            .map(|(_doc, emb)| {
                let vec_f32: Vec<f32> = emb.first().vec.into_iter().map(|x| x as f32).collect();
                Embedding::new(vec_f32)
            })
            .ok_or_else(|| DomainError::embedding_provider("no embedding returned"))?;

        embedding.ensure_dimension(self.dimension)?;
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
