use crate::agents::persona::AgentProfile;
use crate::knowledge::{format_hits, KnowledgeBase};
use crate::providers::CompletionProvider;
use crate::search::{format_results, SearchProvider};
use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

const NO_SEARCH: &str = "NONE";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResponse {
    pub agent: String,
    pub content: String,
}

impl RunResponse {
    pub fn content_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        if self.content.trim().is_empty() {
            placeholder
        } else {
            &self.content
        }
    }
}

/// A persona bound to its own provider instance, optionally backed by the
/// session knowledge base and a web search tool.
pub struct Agent {
    profile: AgentProfile,
    provider: Box<dyn CompletionProvider>,
    knowledge: Option<(Arc<KnowledgeBase>, u64)>,
    web_search: Option<(Arc<dyn SearchProvider>, usize)>,
}

impl Agent {
    pub fn new(profile: AgentProfile, base: &dyn CompletionProvider) -> Self {
        let provider = base.clone_with_system_message(&profile.generate_system_prompt());
        Self {
            profile,
            provider,
            knowledge: None,
            web_search: None,
        }
    }

    pub fn with_knowledge(mut self, knowledge: Arc<KnowledgeBase>, limit: u64) -> Self {
        self.knowledge = Some((knowledge, limit));
        self
    }

    pub fn with_web_search(mut self, search: Arc<dyn SearchProvider>, num_results: usize) -> Self {
        self.web_search = Some((search, num_results));
        self
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub async fn run(&self, input: &str) -> Result<RunResponse> {
        info!("{} running ({} chars of input)", self.name(), input.len());
        let mut sections = Vec::new();

        if let Some(excerpts) = self.knowledge_context(input).await {
            sections.push(format!("Knowledge base excerpts:\n{}", excerpts));
        }
        if let Some(references) = self.web_context(input).await? {
            sections.push(format!("Web references:\n{}", references));
        }
        sections.push(input.to_string());

        let content = self.provider.complete(&sections.join("\n\n")).await?;
        debug!("{} produced {} chars", self.name(), content.len());

        Ok(RunResponse {
            agent: self.profile.name.clone(),
            content,
        })
    }

    async fn knowledge_context(&self, input: &str) -> Option<String> {
        let (knowledge, limit) = self.knowledge.as_ref()?;
        match knowledge.search(input, *limit).await {
            Ok(hits) if hits.is_empty() => None,
            Ok(hits) => Some(format_hits(&hits)),
            Err(e) => {
                warn!("{} knowledge search failed: {}", self.name(), e);
                None
            }
        }
    }

    /// Asks the model whether a web lookup would help; a provider failure
    /// here fails the run, a search failure does not.
    async fn web_context(&self, input: &str) -> Result<Option<String>> {
        let Some((search, num_results)) = self.web_search.as_ref() else {
            return Ok(None);
        };

        let reply = self
            .provider
            .complete(&format!(
                "Suggest one concise web search query that would find legal references for the request below. \
                 Reply with the query only, or {} if no web search is needed.\n\nRequest:\n{}",
                NO_SEARCH, input
            ))
            .await?;

        let Some(query) = parse_search_query(&reply) else {
            debug!("{} skipped web search", self.name());
            return Ok(None);
        };

        match search.search(&query, *num_results).await {
            Ok(results) if results.is_empty() => Ok(None),
            Ok(results) => {
                info!("{} found {} web results via {}", self.name(), results.len(), search.name());
                Ok(Some(format_results(&results)))
            }
            Err(e) => {
                warn!("{} web search for {:?} failed: {}", self.name(), query, e);
                Ok(None)
            }
        }
    }
}

fn parse_search_query(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    let query = line.trim_matches(|c| c == '"' || c == '\'' || c == '`').trim();
    if query.is_empty() || query.eq_ignore_ascii_case(NO_SEARCH) {
        None
    } else {
        Some(query.to_string())
    }
}
