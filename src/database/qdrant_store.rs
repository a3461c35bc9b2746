use crate::database::qdrant_config::create_qdrant_client;
use crate::database::vector_db::{ChunkPayload, ScoredRecord, VectorRecord, VectorStore, VectorStoreError};
use async_trait::async_trait;
use log::info;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config, with_payload_selector::SelectorOptions,
    CountPoints, CreateCollection, Distance, PointId, PointStruct, SearchPoints, UpsertPoints, Value,
    VectorParams, VectorsConfig, WithPayloadSelector,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone)]
pub struct QdrantStore {
    client: Arc<Qdrant>,
}

impl QdrantStore {
    pub async fn connect(url: &str) -> Result<Self, VectorStoreError> {
        let client = create_qdrant_client(url)
            .await
            .map_err(VectorStoreError::Connection)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

fn to_qdrant_payload(payload: ChunkPayload) -> HashMap<String, Value> {
    let mut map = HashMap::new();
    map.insert("text".to_string(), Value::from(payload.text));
    map.insert("source".to_string(), Value::from(payload.source));
    map.insert("page".to_string(), Value::from(payload.page));
    map.insert("chunk".to_string(), Value::from(payload.chunk));
    map.insert("content_id".to_string(), Value::from(payload.content_id));
    map
}

fn from_qdrant_payload(payload: &HashMap<String, Value>) -> ChunkPayload {
    let string = |key: &str| match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    };
    let integer = |key: &str| match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::IntegerValue(i)) => *i,
        Some(Kind::DoubleValue(d)) => *d as i64,
        _ => 0,
    };

    ChunkPayload {
        text: string("text"),
        source: string("source"),
        page: integer("page"),
        chunk: integer("chunk"),
        content_id: string("content_id"),
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, name: &str, vector_size: usize) -> Result<(), VectorStoreError> {
        let vectors_config = VectorsConfig {
            config: Some(vectors_config::Config::Params(VectorParams {
                size: vector_size as u64,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        let create_collection = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(vectors_config),
            ..Default::default()
        };

        match self.client.create_collection(create_collection).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().to_lowercase().contains("already exists") => {
                info!("Collection {} already exists, skipping creation", name);
                Ok(())
            }
            Err(e) => Err(VectorStoreError::Operation(e.to_string())),
        }
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points = records
            .into_iter()
            .map(|record| PointStruct {
                id: Some(PointId {
                    point_id_options: Some(PointIdOptions::Uuid(record.id)),
                }),
                vectors: Some(record.vector.into()),
                payload: to_qdrant_payload(record.payload),
            })
            .collect();

        let upsert_points = UpsertPoints {
            collection_name: collection.to_string(),
            wait: Some(true),
            points,
            ..Default::default()
        };

        self.client
            .upsert_points(upsert_points)
            .await
            .map_err(|e| VectorStoreError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: query_vector,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorStoreError::Operation(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    Some(PointIdOptions::Num(num)) => num.to_string(),
                    None => String::new(),
                };
                ScoredRecord {
                    id,
                    score: point.score,
                    payload: from_qdrant_payload(&point.payload),
                }
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        let response = self
            .client
            .count(CountPoints {
                collection_name: collection.to_string(),
                exact: Some(true),
                ..Default::default()
            })
            .await
            .map_err(|e| VectorStoreError::Operation(e.to_string()))?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_conversion() {
        let payload = ChunkPayload {
            text: "The Receiving Party shall hold in confidence".to_string(),
            source: "nda.pdf".to_string(),
            page: 3,
            chunk: 7,
            content_id: "c-1".to_string(),
        };
        let converted = to_qdrant_payload(payload.clone());
        assert_eq!(converted.len(), 5);
        assert_eq!(from_qdrant_payload(&converted), payload);
    }

    #[test]
    fn test_missing_payload_fields_default() {
        let payload = from_qdrant_payload(&HashMap::new());
        assert_eq!(payload.text, "");
        assert_eq!(payload.page, 0);
    }
}
