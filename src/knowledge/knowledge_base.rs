use crate::database::{ChunkPayload, ContentRecord, ContentsDb, VectorRecord, VectorStore};
use crate::document::{extract_pdf_pages, validate_upload, DocumentChunking, Page};
use crate::providers::CompletionProvider;
use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, info};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::Arc;
use uuid::Uuid;

/// Query used to check that an upload actually produced searchable chunks.
pub const VERIFY_QUERY: &str = "contract";

const QUERY_CACHE_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub content_id: String,
    pub file_name: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeHit {
    pub text: String,
    pub source: String,
    pub page: i64,
    pub score: f32,
}

pub struct KnowledgeBase {
    collection: String,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn CompletionProvider>,
    contents: ContentsDb,
    query_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl KnowledgeBase {
    pub fn new(
        collection: &str,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn CompletionProvider>,
        contents: ContentsDb,
    ) -> Self {
        let capacity = NonZeroUsize::new(QUERY_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            collection: collection.to_string(),
            store,
            embedder,
            contents,
            query_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Validates, extracts, chunks, embeds and indexes one uploaded PDF.
    pub async fn add_content(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        chunking: DocumentChunking,
    ) -> Result<IngestReport> {
        validate_upload(file_name, &bytes)?;
        let pages = extract_pdf_pages(bytes).await?;
        self.add_pages(file_name, &pages, chunking).await
    }

    pub async fn add_pages(
        &self,
        file_name: &str,
        pages: &[Page],
        chunking: DocumentChunking,
    ) -> Result<IngestReport> {
        let content_id = Uuid::new_v4().to_string();
        let chunks = chunking.chunk(pages);
        info!(
            "Indexing {} into {:?}: {} chunks (size {}, overlap {})",
            file_name,
            self.collection,
            chunks.len(),
            chunking.chunk_size(),
            chunking.overlap()
        );

        if !chunks.is_empty() {
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let embeddings = self.embedder.generate_batch_embeddings(&texts).await?;
            if embeddings.len() != chunks.len() {
                return Err(anyhow!(
                    "Embedder returned {} vectors for {} chunks",
                    embeddings.len(),
                    chunks.len()
                ));
            }

            let records = chunks
                .iter()
                .zip(embeddings)
                .map(|(chunk, vector)| VectorRecord {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    payload: ChunkPayload {
                        text: chunk.text.clone(),
                        source: file_name.to_string(),
                        page: chunk.page as i64,
                        chunk: chunk.index as i64,
                        content_id: content_id.clone(),
                    },
                })
                .collect();
            self.store.upsert(&self.collection, records).await?;
        }

        self.contents
            .record_content(ContentRecord {
                id: content_id.clone(),
                name: file_name.to_string(),
                chunk_count: chunks.len(),
                backend: self.backend().to_string(),
                created_at: Utc::now(),
            })
            .await?;

        Ok(IngestReport {
            content_id,
            file_name: file_name.to_string(),
            chunk_count: chunks.len(),
        })
    }

    pub async fn search(&self, query: &str, limit: u64) -> Result<Vec<KnowledgeHit>> {
        let vector = self.query_embedding(query).await?;
        let results = self.store.search(&self.collection, vector, limit).await?;
        debug!("Knowledge search {:?} returned {} hits", query, results.len());

        Ok(results
            .into_iter()
            .filter(|r| !r.payload.text.is_empty())
            .map(|r| KnowledgeHit {
                text: r.payload.text,
                source: r.payload.source,
                page: r.payload.page,
                score: r.score,
            })
            .collect())
    }

    pub async fn verify(&self, limit: u64) -> Result<Vec<KnowledgeHit>> {
        self.search(VERIFY_QUERY, limit).await
    }

    pub async fn contents(&self) -> Result<Vec<ContentRecord>> {
        Ok(self.contents.list_contents().await?)
    }

    async fn query_embedding(&self, query: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.query_cache.lock().get(query) {
            return Ok(vector.clone());
        }
        let vector = self.embedder.generate_embedding(query).await?;
        self.query_cache.lock().put(query.to_string(), vector.clone());
        Ok(vector)
    }
}

/// Renders hits as numbered excerpts for inclusion in a prompt.
pub fn format_hits(hits: &[KnowledgeHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "[{}] ({} p.{}, score {:.2})\n{}",
                i + 1,
                hit.source,
                hit.page,
                hit.score,
                hit.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
