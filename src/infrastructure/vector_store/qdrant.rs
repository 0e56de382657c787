use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use uuid::Uuid;

use crate::domain::{
    ports::VectorIndex, ChunkFilter, ChunkMetadata, ChunkPoint, DomainError, Embedding,
    ScoredChunk,
};

pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantVectorIndex {
    pub async fn new(url: &str, collection: &str, dimension: usize) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let index = Self {
            client,
            collection: collection.to_string(),
            dimension,
        };

        index.ensure_collection().await?;

        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| DomainError::vector_store(e.to_string()))?;
        }

        Ok(())
    }

    /// Maps the deterministic chunk id onto a stable point id, so
    /// re-ingesting the same document replaces its chunks in place.
    fn point_id(chunk_id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
    }

    /// The index rejects null metadata values, so `folder_id` is only ever
    /// written when present.
    fn payload_for(point: &ChunkPoint) -> Result<Payload, DomainError> {
        let metadata = &point.metadata;
        let mut value = serde_json::json!({
            "chunk_id": point.id,
            "file_id": metadata.file_id,
            "page": metadata.page,
            "chunk_index": metadata.chunk_index,
            "text": metadata.text,
            "user_id": metadata.user_id,
        });
        if let Some(folder_id) = &metadata.folder_id {
            value["folder_id"] = serde_json::json!(folder_id);
        }

        value
            .try_into()
            .map_err(|_| DomainError::internal("failed to build point payload"))
    }

    fn filter_for(filter: &ChunkFilter) -> Filter {
        let mut conditions = Vec::new();
        if let Some(file_id) = &filter.file_id {
            conditions.push(Condition::matches("file_id", file_id.clone()));
        }
        if let Some(folder_id) = &filter.folder_id {
            conditions.push(Condition::matches("folder_id", folder_id.clone()));
        }
        conditions.push(Condition::matches("user_id", filter.user_id.clone()));
        Filter::must(conditions)
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn upsert(&self, points: &[ChunkPoint]) -> Result<(), DomainError> {
        if points.is_empty() {
            return Ok(());
        }

        let mut structs = Vec::with_capacity(points.len());
        for point in points {
            point.embedding.ensure_dimension(self.dimension)?;
            structs.push(PointStruct::new(
                Self::point_id(&point.id),
                point.embedding.as_slice().to_vec(),
                Self::payload_for(point)?,
            ));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, structs))
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        embedding: &Embedding,
        filter: &ChunkFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection,
                    embedding.as_slice().to_vec(),
                    top_k as u64,
                )
                .filter(Self::filter_for(filter))
                .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let chunks: Vec<ScoredChunk> = results
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;

                let metadata = ChunkMetadata {
                    file_id: payload.get("file_id")?.as_str()?.to_string(),
                    page: payload.get("page")?.as_integer()? as usize,
                    chunk_index: payload.get("chunk_index")?.as_integer()? as usize,
                    text: payload.get("text")?.as_str()?.to_string(),
                    user_id: payload.get("user_id")?.as_str()?.to_string(),
                    folder_id: payload
                        .get("folder_id")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                };

                Some(ScoredChunk {
                    score: point.score,
                    metadata,
                })
            })
            .collect();

        Ok(chunks)
    }

    async fn delete_by_file(&self, file_id: &str, user_id: &str) -> Result<(), DomainError> {
        let filter = Filter::must([
            Condition::matches("file_id", file_id.to_string()),
            Condition::matches("user_id", user_id.to_string()),
        ]);

        self.client
            .delete_points(DeletePointsBuilder::new(&self.collection).points(filter))
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(())
    }
}
