use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Search timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError>;

    fn name(&self) -> &'static str;
}

/// Numbered listing used when results are handed to a model.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            if r.snippet.is_empty() {
                format!("{}. {} — {}", i + 1, r.title, r.url)
            } else {
                format!("{}. {} — {}\n   {}", i + 1, r.title, r.url, r.snippet)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
