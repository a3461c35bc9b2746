const MARKDOWN_DIRECTIVE: &str = "Use markdown to format your answers.";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub markdown: bool,
}

impl AgentProfile {
    pub fn new(name: &str, description: &str, instructions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
            markdown: true,
        }
    }

    pub fn generate_system_prompt(&self) -> String {
        let mut prompt = format!("You are {}. {}", self.name, self.description);

        if !self.instructions.is_empty() {
            prompt.push_str("\n\n<instructions>\n");
            for (i, instruction) in self.instructions.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, instruction));
            }
            prompt.push_str("</instructions>");
        }

        if self.markdown {
            prompt.push_str("\n\n");
            prompt.push_str(MARKDOWN_DIRECTIVE);
        }

        prompt
    }

    pub fn legal_advisor() -> Self {
        Self::new(
            "LegalAdvisor",
            "Legal Researcher AI - Finds and cites relevant legal cases, regulations, and precedents using all data in the knowledge base.",
            &[
                "Act like Harvey Specter — extremely sharp, confident, and strategic lawyer.",
                "You have access to a knowledge base containing uploaded legal documents. ALWAYS search this knowledge base first before responding.",
                "Extract and explain only the most relevant legal cases, statutes, and precedents from the uploaded documents. Focus on what actually impacts the matter.",
                "Be concise, structured, and high-value — avoid fluff or repetition.",
                "Highlight critical points that must not be missed.",
                "Summarize in a way that is easy to read, clear, and actionable, without losing essential detail.",
                "Always cite sources and document references clearly.",
                "If needed, use DuckDuckGo for additional legal references.",
            ],
        )
    }

    pub fn contract_analyst() -> Self {
        Self::new(
            "ContractAnalyst",
            "Contract Analyst AI - Reviews contracts and identifies key clauses, risks, and obligations using the full document data.",
            &[
                "You have access to uploaded legal documents in the knowledge base. ALWAYS search this knowledge base to find the contract content.",
                "Analyze the contract like a top corporate lawyer — focus on key clauses, obligations, and risks that truly matter.",
                "Identify ambiguities, hidden obligations, or potential pitfalls from the actual contract text.",
                "Keep analysis concise, structured, and highly actionable.",
                "Highlight critical sections clearly — nothing essential should be lost.",
                "Use bullet points or structured format for readability, but ensure it's meaningful, not just superficial.",
            ],
        )
    }

    pub fn legal_strategist() -> Self {
        Self::new(
            "LegalStrategist",
            "Legal Strategist AI - Provides comprehensive risk assessment and strategic recommendations based on all the available data from the contract.",
            &[
                "You have access to uploaded legal documents in the knowledge base. ALWAYS search this knowledge base to find the contract content.",
                "Act like a strategic, top-of-class lawyer analyzing a contract for risks, opportunities, and leverage points.",
                "Prioritize the most important legal risks and potential gains from the actual contract text.",
                "Provide concise, actionable recommendations that a lawyer would actually use to make decisions.",
                "Highlight critical points clearly and avoid unnecessary details.",
                "Ensure recommendations are legally sound and aligned with best practices.",
            ],
        )
    }

    pub fn team_lead() -> Self {
        Self::new(
            "teamlead",
            "Team Lead AI - Integrates responses from the Legal Researcher, Contract Analyst, and Legal Strategist into a comprehensive report.",
            &[
                "Filter and prioritize the responses of the LegalAdvisor, ContractAnalyst, and LegalStrategist.",
                "Do not include every point they mention. Summarize only the most critical insights.",
                "Structure the output as: Executive Summary, Critical Clauses & Obligations, Risks & Weak Points, Recommendations.",
                "Write in the tone of a top lawyer: sharp, concise, and meaningful. No fluff, no robotic repetition.",
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_numbers_instructions() {
        let profile = AgentProfile::new("Clerk", "Files things.", &["Be brief.", "Cite pages."]);
        let prompt = profile.generate_system_prompt();
        assert!(prompt.starts_with("You are Clerk. Files things."));
        assert!(prompt.contains("1. Be brief.\n2. Cite pages.\n"));
        assert!(prompt.ends_with(MARKDOWN_DIRECTIVE));
    }

    #[test]
    fn test_bare_profile_prompt() {
        let profile = AgentProfile {
            markdown: false,
            ..AgentProfile::new("Clerk", "Files things.", &[])
        };
        assert_eq!(profile.generate_system_prompt(), "You are Clerk. Files things.");
    }

    #[test]
    fn test_team_profiles() {
        assert_eq!(AgentProfile::legal_advisor().instructions.len(), 8);
        assert_eq!(AgentProfile::contract_analyst().instructions.len(), 6);
        assert_eq!(AgentProfile::legal_strategist().instructions.len(), 6);
        assert_eq!(AgentProfile::team_lead().name, "teamlead");
    }
}
