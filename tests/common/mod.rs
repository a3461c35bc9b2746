#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_legal_agent::config::ChunkingParams;
use rust_legal_agent::database::{
    ContentsDb, InMemoryStore, ScoredRecord, VectorRecord, VectorStore, VectorStoreError,
};
use rust_legal_agent::document::{DocumentChunking, Page};
use rust_legal_agent::knowledge::KnowledgeBase;
use rust_legal_agent::providers::CompletionProvider;
use rust_legal_agent::search::{SearchError, SearchProvider, SearchResult};
use std::sync::Arc;

pub const DIMENSIONS: usize = 3;

/// Replies based on the prompt the team sends and records every call.
pub struct ScriptedProvider {
    system_message: RwLock<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            system_message: RwLock::new(String::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn agents_called(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|(system, _)| agent_name(system).to_string())
            .collect()
    }
}

pub fn agent_name(system: &str) -> &str {
    system
        .strip_prefix("You are ")
        .and_then(|rest| rest.split('.').next())
        .unwrap_or("")
}

fn reply(system: &str, prompt: &str) -> String {
    let scripted = [
        ("Suggest one concise web search query", "NONE"),
        (
            "Extract the most critical clauses",
            "- High Risk: Unlimited liability for the Receiving Party\n\n- Medium Risk: Automatic renewal\n- Low Risk: Governing law is Delaware",
        ),
        ("List only the strengths", "Clear payment terms\n\nMutual confidentiality"),
        ("List only the weaknesses", "One-sided termination right"),
        ("Provide specific, actionable", "Cap liability at fees paid"),
        ("Rewrite this analysis focusing only on the receiving party", "Client should negotiate the cap."),
        ("Rewrite this analysis focusing only on the issuing party", "Issuer keeps broad remedies."),
    ];
    for (prefix, answer) in scripted {
        if prompt.starts_with(prefix) {
            return answer.to_string();
        }
    }
    format!("{} analysis of the agreement", agent_name(system))
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let system = self.system_message.read().clone();
        let answer = reply(&system, prompt);
        self.calls.lock().push((system, prompt.to_string()));
        Ok(answer)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(["contract", "agreement", "liability"]
            .iter()
            .map(|word| lower.matches(word).count() as f32 + 0.5)
            .collect())
    }

    fn update_system_message(&self, system_message: String) {
        *self.system_message.write() = system_message;
    }

    fn get_system_message(&self) -> String {
        self.system_message.read().clone()
    }

    fn get_model_info(&self) -> String {
        "scripted".to_string()
    }

    fn clone_with_system_message(&self, system_message: &str) -> Box<dyn CompletionProvider> {
        Box::new(Self {
            system_message: RwLock::new(system_message.to_string()),
            calls: self.calls.clone(),
        })
    }
}

pub struct NoWebResults;

#[async_trait]
impl SearchProvider for NoWebResults {
    async fn search(&self, _query: &str, _num_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

pub async fn empty_knowledge(embedder: Arc<ScriptedProvider>) -> Arc<KnowledgeBase> {
    let store = InMemoryStore::new();
    store.ensure_collection("law", DIMENSIONS).await.unwrap();
    let contents = ContentsDb::in_memory().await.unwrap();
    Arc::new(KnowledgeBase::new("law", Arc::new(store), embedder, contents))
}

pub async fn nda_knowledge(embedder: Arc<ScriptedProvider>) -> Arc<KnowledgeBase> {
    let knowledge = empty_knowledge(embedder).await;
    let pages = vec![
        Page {
            number: 1,
            text: "MUTUAL NON-DISCLOSURE AGREEMENT\n\nThis Agreement is entered into between Acme Corp and the Receiving Party.".to_string(),
        },
        Page {
            number: 2,
            text: "The Receiving Party accepts unlimited liability for any breach of this contract.".to_string(),
        },
    ];
    knowledge
        .add_pages("nda.pdf", &pages, DocumentChunking::new(ChunkingParams::new(120, 20)))
        .await
        .unwrap();
    knowledge
}


pub const NDA_PDF: &[u8] = include_bytes!("../fixtures/nda.pdf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Normal,
    Empty,
    Failing,
}

/// In-memory store whose search can be forced to return nothing or fail.
pub struct ScriptedStore {
    inner: InMemoryStore,
    mode: SearchMode,
}

impl ScriptedStore {
    pub fn new(mode: SearchMode) -> Self {
        Self { inner: InMemoryStore::new(), mode }
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    async fn ensure_collection(&self, name: &str, vector_size: usize) -> Result<(), VectorStoreError> {
        self.inner.ensure_collection(name, vector_size).await
    }

    async fn upsert(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        self.inner.upsert(collection, records).await
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredRecord>, VectorStoreError> {
        match self.mode {
            SearchMode::Normal => self.inner.search(collection, query_vector, limit).await,
            SearchMode::Empty => Ok(Vec::new()),
            SearchMode::Failing => Err(VectorStoreError::Operation("search timed out".to_string())),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64, VectorStoreError> {
        self.inner.count(collection).await
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}
