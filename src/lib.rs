pub mod agents;
pub mod analysis;
pub mod api;
pub mod config;
pub mod database;
pub mod document;
pub mod knowledge;
pub mod providers;
pub mod search;
pub mod session;

// Re-export commonly used items
pub use agents::{Agent, AgentProfile, LegalTeam};
pub use config::AppConfig;
pub use knowledge::KnowledgeBase;
