pub mod contents_db;
pub mod memory_store;
pub mod qdrant_config;
pub mod qdrant_store;
pub mod vector_db;

pub use contents_db::{ContentRecord, ContentsDb, ContentsDbError};
pub use memory_store::InMemoryStore;
pub use qdrant_store::QdrantStore;
pub use vector_db::{
    connect_vector_store, ChunkPayload, ScoredRecord, VectorRecord, VectorStore, VectorStoreError,
};
