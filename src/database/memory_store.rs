use crate::database::vector_db::{ScoredRecord, VectorRecord, VectorStore, VectorStoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

struct Collection {
    vector_size: usize,
    records: Vec<VectorRecord>,
}

/// Process-local vector store used when Qdrant cannot be reached. Contents
/// are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some((dot / denom) as f32)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn ensure_collection(&self, name: &str, vector_size: usize) -> Result<(), VectorStoreError> {
        self.collections
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                vector_size,
                records: Vec::new(),
            });
        Ok(())
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write();
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorStoreError::MissingCollection(collection.to_string()))?;

        if let Some(bad) = records.iter().find(|r| r.vector.len() != target.vector_size) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: target.vector_size,
                actual: bad.vector.len(),
            });
        }

        for record in records {
            match target.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => target.records.push(record),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let collections = self.collections.read();
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::MissingCollection(collection.to_string()))?;

        if query_vector.len() != target.vector_size {
            return Err(VectorStoreError::DimensionMismatch {
                expected: target.vector_size,
                actual: query_vector.len(),
            });
        }

        let mut hits: Vec<(usize, ScoredRecord)> = target
            .records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| {
                let score = cosine_similarity(&query_vector, &record.vector)?;
                Some((
                    position,
                    ScoredRecord {
                        id: record.id.clone(),
                        score,
                        payload: record.payload.clone(),
                    },
                ))
            })
            .collect();

        hits.sort_by(|(pa, a), (pb, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| pa.cmp(pb))
        });
        hits.truncate(limit as usize);
        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        Ok(self
            .collections
            .read()
            .get(collection)
            .map(|c| c.records.len() as u64)
            .unwrap_or(0))
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}
