use crate::agents::{LegalTeam, Party};
use anyhow::Result;
use log::info;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub const NO_RESPONSE: &str = "No response generated.";
pub const NO_CLIENT_VIEW: &str = "No client-specific analysis.";
pub const NO_ISSUING_VIEW: &str = "No issuing-party-specific analysis.";
pub const NO_CLAUSES: &str = "No critical clauses identified.";
pub const NO_STRENGTHS: &str = "No strengths found.";
pub const NO_WEAKNESSES: &str = "No weaknesses found.";
pub const NO_RECOMMENDATIONS: &str = "No recommendations generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisType {
    ContractReview,
    LegalResearch,
    RiskAssessment,
    ComplianceCheck,
    CustomQuery,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::ContractReview,
        AnalysisType::LegalResearch,
        AnalysisType::RiskAssessment,
        AnalysisType::ComplianceCheck,
        AnalysisType::CustomQuery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::ContractReview => "Contract Review",
            AnalysisType::LegalResearch => "Legal Research",
            AnalysisType::RiskAssessment => "Risk Assessment",
            AnalysisType::ComplianceCheck => "Compliance Check",
            AnalysisType::CustomQuery => "Custom Query",
        }
    }

    /// Fixed team query; Custom Query goes through chat instead.
    pub fn predefined_query(&self) -> Option<&'static str> {
        match self {
            AnalysisType::ContractReview => Some(
                "SEARCH the knowledge base for the uploaded contract document. Analyze the contract content you find and identify key terms, obligations, and risks in detail. \
                 Provide specific quotes from the contract text to support your analysis.",
            ),
            AnalysisType::LegalResearch => Some(
                "SEARCH the knowledge base for the uploaded legal document. Using the document content you find, identify relevant legal cases and precedents. \
                 Provide detailed references and sources from the document.",
            ),
            AnalysisType::RiskAssessment => Some(
                "SEARCH the knowledge base for the uploaded document content. Extract the contract text and identify potential legal risks. \
                 Detail specific risk areas and reference exact sections or clauses from the document.",
            ),
            AnalysisType::ComplianceCheck => Some(
                "SEARCH the knowledge base for the uploaded contract document. Evaluate the contract content for compliance with legal regulations. \
                 Highlight any areas of concern and suggest corrective actions, citing specific contract provisions.",
            ),
            AnalysisType::CustomQuery => None,
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .iter()
            .copied()
            .find(|t| t.label() == s.trim())
            .ok_or_else(|| format!("Unknown analysis type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Specific labels are tested before the bare word "Risk". This ordering is
    /// deliberate: matching "Risk" first would box every "Low Risk" line as
    /// medium and leave the green box unreachable.
    pub fn classify(line: &str) -> Option<RiskLevel> {
        if line.contains("High Risk") {
            Some(RiskLevel::High)
        } else if line.contains("Medium Risk") {
            Some(RiskLevel::Medium)
        } else if line.contains("Low Risk") || line.contains("Safe") {
            Some(RiskLevel::Low)
        } else if line.contains("Risk") {
            Some(RiskLevel::Medium)
        } else {
            None
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            RiskLevel::High => "🔴",
            RiskLevel::Medium => "⚠️",
            RiskLevel::Low => "✅",
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            RiskLevel::High => "#fee2e2",
            RiskLevel::Medium => "#fef9c3",
            RiskLevel::Low => "#dcfce7",
        }
    }

    pub fn border(&self) -> &'static str {
        match self {
            RiskLevel::High => "#dc2626",
            RiskLevel::Medium => "#ca8a04",
            RiskLevel::Low => "#16a34a",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseLine {
    pub level: Option<RiskLevel>,
    pub text: String,
}

pub fn classify_clauses(content: &str) -> Vec<ClauseLine> {
    non_blank_lines(content)
        .into_iter()
        .map(|text| ClauseLine {
            level: RiskLevel::classify(&text),
            text,
        })
        .collect()
}

pub fn non_blank_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Everything shown after "Analyze". Empty fields render as placeholders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub analysis_type: Option<AnalysisType>,
    pub precheck_note: Option<String>,
    pub executive_summary: String,
    pub client_view: String,
    pub issuing_view: String,
    pub clauses: Vec<ClauseLine>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Runs the team and every follow-up prompt one after another. Nothing
/// beyond the team response is requested when that response is empty.
pub async fn build_report(
    team: &LegalTeam,
    analysis_type: AnalysisType,
    query: &str,
) -> Result<AnalysisReport> {
    let response = team.get_team_response(query).await?;
    let mut report = AnalysisReport {
        analysis_type: Some(analysis_type),
        precheck_note: response.precheck_note,
        executive_summary: response.content,
        ..Default::default()
    };

    if report.executive_summary.trim().is_empty() {
        return Ok(report);
    }
    let analysis = report.executive_summary.clone();

    report.client_view = team.rewrite_for_party(&analysis, Party::ReceivingParty).await?.content;
    report.issuing_view = team.rewrite_for_party(&analysis, Party::IssuingParty).await?.content;
    report.clauses = classify_clauses(&team.critical_clauses(&analysis).await?.content);
    report.strengths = non_blank_lines(&team.strengths(&analysis).await?.content);
    report.weaknesses = non_blank_lines(&team.weaknesses(&analysis).await?.content);
    report.recommendations = non_blank_lines(&team.recommendations(&analysis).await?.content);

    info!(
        "{} report: {} clauses, {} strengths, {} weaknesses, {} recommendations",
        analysis_type,
        report.clauses.len(),
        report.strengths.len(),
        report.weaknesses.len(),
        report.recommendations.len()
    );
    Ok(report)
}
