use super::types::{SearchError, SearchProvider, SearchResult};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const TIMEOUT_MS: u64 = 10_000;

/// DuckDuckGo HTML endpoint. No API key required.
#[derive(Clone)]
pub struct DuckDuckGoProvider {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoProvider {
    pub fn new() -> Self {
        Self::with_endpoint(DDG_HTML_URL)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(TIMEOUT_MS))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidQuery {
                reason: "query is empty".to_string(),
            });
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout { timeout_ms: TIMEOUT_MS }
                } else {
                    SearchError::ApiError { status: 0, message: e.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::ApiError {
                status: status.as_u16(),
                message: "DuckDuckGo request failed".to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::ApiError { status: 0, message: e.to_string() })?;

        let results = parse_results(&html, num_results)?;
        debug!("DuckDuckGo returned {} results for {:?}", results.len(), query);
        Ok(results)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

fn selector(css: &str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::ApiError {
        status: 0,
        message: format!("invalid selector {}: {:?}", css, e),
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
    let document = Html::parse_document(html);
    let result_sel = selector("div.result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for block in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(link) = block.select(&link_sel).next() else {
            continue;
        };
        let url = link.value().attr("href").map(resolve_url).unwrap_or_default();
        let title = element_text(link);
        if url.is_empty() || title.is_empty() {
            continue;
        }

        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        results.push(SearchResult { title, url, snippet });
    }

    Ok(results)
}

/// DDG wraps targets as `//duckduckgo.com/l/?uddg=<encoded>&rut=...`.
fn resolve_url(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let encoded = href[pos + 5..].split('&').next().unwrap_or_default();
        urlencoding::decode(encoded)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_default()
    } else if href.starts_with("http") {
        href.to_string()
    } else {
        String::new()
    }
}
