pub mod agent;
pub mod persona;
pub mod team;

pub use agent::{Agent, RunResponse};
pub use persona::AgentProfile;
pub use team::{LegalTeam, Party, TeamResponse};

#[cfg(test)]
pub(crate) mod mock;
