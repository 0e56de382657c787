use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{
    ports::VectorIndex, ChunkFilter, ChunkPoint, DomainError, Embedding, ScoredChunk,
};

/// Filter-aware in-memory index with cosine similarity. Backs the test
/// suite and local development without a running vector database.
pub struct InMemoryVectorIndex {
    points: RwLock<Vec<ChunkPoint>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            points: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.points.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matches(filter: &ChunkFilter, point: &ChunkPoint) -> bool {
        if point.metadata.user_id != filter.user_id {
            return false;
        }
        if let Some(file_id) = &filter.file_id {
            if &point.metadata.file_id != file_id {
                return false;
            }
        }
        if let Some(folder_id) = &filter.folder_id {
            if point.metadata.folder_id.as_ref() != Some(folder_id) {
                return false;
            }
        }
        true
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, points: &[ChunkPoint]) -> Result<(), DomainError> {
        let mut store = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        for point in points {
            store.retain(|p| p.id != point.id);
            store.push(point.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &Embedding,
        filter: &ChunkFilter,
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, DomainError> {
        let store = self
            .points
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut results: Vec<ScoredChunk> = store
            .iter()
            .filter(|point| Self::matches(filter, point))
            .map(|point| ScoredChunk {
                score: embedding.cosine_similarity(&point.embedding),
                metadata: point.metadata.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(results.into_iter().take(top_k).collect())
    }

    async fn delete_by_file(&self, file_id: &str, user_id: &str) -> Result<(), DomainError> {
        let mut store = self
            .points
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store.retain(|p| !(p.metadata.file_id == file_id && p.metadata.user_id == user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{chunk_id, ChunkMetadata};

    fn point(file_id: &str, user_id: &str, folder_id: Option<&str>, index: usize, axis: usize) -> ChunkPoint {
        let mut vector = vec![0.0f32; 4];
        vector[axis % 4] = 1.0;
        ChunkPoint {
            id: chunk_id(file_id, 1, index),
            embedding: Embedding::new(vector),
            metadata: ChunkMetadata {
                file_id: file_id.to_string(),
                page: 1,
                chunk_index: index,
                text: format!("{file_id} chunk {index}"),
                user_id: user_id.to_string(),
                folder_id: folder_id.map(str::to_string),
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_same_id_twice_keeps_second_entry() {
        let index = InMemoryVectorIndex::new();

        let mut first = point("f1", "u1", None, 1, 0);
        first.metadata.text = "first text".into();
        let mut second = point("f1", "u1", None, 1, 0);
        second.metadata.text = "second text".into();

        index.upsert(&[first]).await.unwrap();
        index.upsert(&[second]).await.unwrap();

        assert_eq!(index.len(), 1);
        let results = index
            .query(
                &Embedding::new(vec![1.0, 0.0, 0.0, 0.0]),
                &ChunkFilter::for_file("u1", "f1"),
                10,
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.text, "second text");
    }

    #[tokio::test]
    async fn test_file_filter_isolates_users() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(&[point("shared-file", "u1", None, 1, 0)])
            .await
            .unwrap();
        index
            .upsert(&[point("shared-file", "u2", None, 1, 0)])
            .await
            .unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0, 0.0]);
        let results = index
            .query(&query, &ChunkFilter::for_file("u1", "shared-file"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.user_id, "u1");
    }

    #[tokio::test]
    async fn test_folder_filter_excludes_unfiled_chunks() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(&[
                point("a", "u1", Some("folder-1"), 1, 0),
                point("b", "u1", None, 1, 1),
            ])
            .await
            .unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0, 0.0]);
        let results = index
            .query(&query, &ChunkFilter::for_folder("u1", "folder-1"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.file_id, "a");
    }

    #[tokio::test]
    async fn test_query_orders_by_score_descending() {
        let index = InMemoryVectorIndex::new();
        let mut close = point("f1", "u1", None, 1, 0);
        close.embedding = Embedding::new(vec![1.0, 0.1, 0.0, 0.0]);
        let mut far = point("f1", "u1", None, 2, 0);
        far.embedding = Embedding::new(vec![0.3, 1.0, 0.0, 0.0]);
        index.upsert(&[far, close]).await.unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0, 0.0]);
        let results = index
            .query(&query, &ChunkFilter::for_file("u1", "f1"), 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].metadata.chunk_index, 1);
    }

    #[tokio::test]
    async fn test_delete_by_file_respects_owner() {
        let index = InMemoryVectorIndex::new();
        index
            .upsert(&[
                point("f1", "u1", None, 1, 0),
                point("f1", "u2", None, 1, 1),
            ])
            .await
            .unwrap();

        index.delete_by_file("f1", "u1").await.unwrap();

        assert_eq!(index.len(), 1);
        let results = index
            .query(
                &Embedding::new(vec![0.0, 1.0, 0.0, 0.0]),
                &ChunkFilter::for_file("u2", "f1"),
                10,
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
