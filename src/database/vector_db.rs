use crate::config::AppConfig;
use crate::database::{InMemoryStore, QdrantStore};
use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Collection not found: {0}")]
    MissingCollection(String),
    #[error("Vector has {actual} dimensions, collection expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// What is stored next to every chunk vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub text: String,
    pub source: String,
    pub page: i64,
    pub chunk: i64,
    pub content_id: String,
}

#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creating an existing collection is not an error.
    async fn ensure_collection(&self, name: &str, vector_size: usize) -> Result<(), VectorStoreError>;

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError>;

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError>;

    fn backend(&self) -> &'static str;
}

/// Qdrant when reachable, otherwise a process-local store.
pub async fn connect_vector_store(config: &AppConfig) -> Arc<dyn VectorStore> {
    match QdrantStore::connect(&config.qdrant_url).await {
        Ok(store) => match store
            .ensure_collection(&config.collection, config.embedding_dimensions)
            .await
        {
            Ok(()) => {
                info!("Using Qdrant collection {:?}", config.collection);
                return Arc::new(store);
            }
            Err(e) => warn!("Qdrant collection setup failed, falling back to in-memory store: {}", e),
        },
        Err(e) => warn!("Qdrant unavailable, falling back to in-memory store: {}", e),
    }

    let store = InMemoryStore::new();
    if let Err(e) = store
        .ensure_collection(&config.collection, config.embedding_dimensions)
        .await
    {
        warn!("In-memory collection setup failed: {}", e);
    }
    Arc::new(store)
}
