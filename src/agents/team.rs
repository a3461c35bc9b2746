use crate::agents::agent::{Agent, RunResponse};
use crate::agents::persona::AgentProfile;
use crate::config::AppConfig;
use crate::knowledge::KnowledgeBase;
use crate::providers::CompletionProvider;
use crate::search::SearchProvider;
use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;

const PRECHECK_QUERY: &str = "contract agreement terms";
const PREVIEW_CHARS: usize = 200;

const CHAT_DIRECTIVE: &str = "Answer the user's question strictly and concisely based on the uploaded document. \
    Provide only the direct answer in 3-5 sentences and avoid a long legal analysis. \
    Cite document sections briefly if essential.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    ReceivingParty,
    IssuingParty,
}

impl Party {
    fn perspective(&self) -> &'static str {
        match self {
            Party::ReceivingParty => "the receiving party (client)'s perspective",
            Party::IssuingParty => "the issuing party's perspective",
        }
    }
}

/// Team output plus the knowledge precheck note shown above the report.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamResponse {
    pub content: String,
    pub precheck_note: Option<String>,
}

pub struct LegalTeam {
    researcher: Agent,
    analyst: Agent,
    strategist: Agent,
    lead: Agent,
    knowledge: Arc<KnowledgeBase>,
    knowledge_results: u64,
}

impl LegalTeam {
    pub fn new(
        provider: &dyn CompletionProvider,
        knowledge: Arc<KnowledgeBase>,
        web_search: Arc<dyn SearchProvider>,
        config: &AppConfig,
    ) -> Self {
        let limit = config.knowledge_results;
        Self {
            researcher: Agent::new(AgentProfile::legal_advisor(), provider)
                .with_knowledge(knowledge.clone(), limit)
                .with_web_search(web_search, config.web_search_results),
            analyst: Agent::new(AgentProfile::contract_analyst(), provider)
                .with_knowledge(knowledge.clone(), limit),
            strategist: Agent::new(AgentProfile::legal_strategist(), provider)
                .with_knowledge(knowledge.clone(), limit),
            lead: Agent::new(AgentProfile::team_lead(), provider),
            knowledge,
            knowledge_results: limit,
        }
    }

    /// Runs researcher, analyst and strategist in order and lets the team
    /// lead integrate them. An empty or failing knowledge base short-circuits
    /// with an explanatory message instead.
    pub async fn get_team_response(&self, query: &str) -> Result<TeamResponse> {
        let hits = match self.knowledge.search(PRECHECK_QUERY, self.knowledge_results).await {
            Ok(hits) if hits.is_empty() => {
                return Ok(TeamResponse {
                    content: "No document content found in knowledge base. Please upload a PDF document first."
                        .to_string(),
                    precheck_note: None,
                });
            }
            Ok(hits) => hits,
            Err(e) => {
                warn!("Knowledge precheck failed: {}", e);
                return Ok(TeamResponse {
                    content: format!(
                        "Error accessing knowledge base: {}. Please ensure document was uploaded successfully.",
                        e
                    ),
                    precheck_note: None,
                });
            }
        };

        let preview: String = hits[0].text.chars().take(PREVIEW_CHARS).collect();
        let precheck_note = format!(
            "🔍 Knowledge base search found {} results. First result preview: {}...",
            hits.len(),
            preview
        );

        let research = self.researcher.run(query).await?;
        let contract = self.analyst.run(query).await?;
        let strategy = self.strategist.run(query).await?;

        let integrated = self
            .lead
            .run(&format!(
                "Summarize and integrate the following insights gathered using the full contract data:\n\n\
                 Legal Researcher:\n{}\n\n\
                 Contract Analyst:\n{}\n\n\
                 Legal Strategist:\n{}\n\n\
                 Provide a structured legal analysis report that includes key terms, obligations, risks, and recommendations, with references to the document.",
                research.content, contract.content, strategy.content
            ))
            .await?;
        info!("Team response ready ({} chars)", integrated.content.len());

        Ok(TeamResponse {
            content: integrated.content,
            precheck_note: Some(precheck_note),
        })
    }

    pub async fn chat(&self, question: &str) -> Result<RunResponse> {
        self.researcher
            .run(&format!("{}\n\nQuestion: {}", CHAT_DIRECTIVE, question))
            .await
    }

    pub async fn rewrite_for_party(&self, analysis: &str, party: Party) -> Result<RunResponse> {
        self.lead
            .run(&format!(
                "Rewrite this analysis focusing only on {}:\n{}",
                party.perspective(),
                analysis
            ))
            .await
    }

    pub async fn critical_clauses(&self, analysis: &str) -> Result<RunResponse> {
        self.lead
            .run(&format!(
                "Extract the most critical clauses from this legal document. \
                 Categorize them into High Risk, Medium Risk, and Low Risk. Format as bullet points:\n{}",
                analysis
            ))
            .await
    }

    pub async fn strengths(&self, analysis: &str) -> Result<RunResponse> {
        self.lead
            .run(&format!("List only the strengths from this analysis:\n{}", analysis))
            .await
    }

    pub async fn weaknesses(&self, analysis: &str) -> Result<RunResponse> {
        self.lead
            .run(&format!("List only the weaknesses from this analysis:\n{}", analysis))
            .await
    }

    pub async fn recommendations(&self, analysis: &str) -> Result<RunResponse> {
        self.lead
            .run(&format!(
                "Provide specific, actionable legal recommendations in bullet points based on this analysis:\n{}",
                analysis
            ))
            .await
    }
}
