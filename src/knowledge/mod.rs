#[allow(clippy::module_inception)]
mod knowledge_base;

pub use knowledge_base::{format_hits, IngestReport, KnowledgeBase, KnowledgeHit, VERIFY_QUERY};
