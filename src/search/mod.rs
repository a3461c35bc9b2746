//! Web search tool available to agents.

mod duckduckgo;
mod types;

pub use duckduckgo::DuckDuckGoProvider;
pub use types::{format_results, SearchError, SearchProvider, SearchResult};
