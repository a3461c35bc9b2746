use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;
pub const CHUNK_SIZE_RANGE: (usize, usize) = (1, 5000);
pub const OVERLAP_RANGE: (usize, usize) = (1, 1000);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub api_base: String,
    pub temperature: f32,
    pub qdrant_url: String,
    pub collection: String,
    pub contents_db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub web_search_results: usize,
    pub knowledge_results: u64,
    pub max_sessions: usize,
    pub session_idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            chat_model: "gemini-2.5-flash".to_string(),
            embedding_model: "gemini-embedding-001".to_string(),
            embedding_dimensions: 1536,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            qdrant_url: "http://localhost:6333".to_string(),
            collection: "law".to_string(),
            contents_db_path: PathBuf::from("tmp/contents_db/law.db"),
            host: "0.0.0.0".to_string(),
            port: 8501,
            web_search_results: 5,
            knowledge_results: 5,
            max_sessions: 256,
            session_idle_secs: 3600,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // GOOGLE_API_KEY wins over GEMINI_API_KEY
        let api_key = env::var("GOOGLE_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            api_key,
            chat_model: env::var("GEMINI_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: env::var("GEMINI_EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            embedding_dimensions: parse_var("GEMINI_EMBEDDING_DIMENSIONS", defaults.embedding_dimensions),
            api_base: env::var("GEMINI_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            temperature: parse_var("GEMINI_TEMPERATURE", defaults.temperature),
            qdrant_url: env::var("QDRANT_URL").unwrap_or(defaults.qdrant_url),
            collection: env::var("KNOWLEDGE_COLLECTION").unwrap_or(defaults.collection),
            contents_db_path: env::var("CONTENTS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.contents_db_path),
            host: defaults.host,
            port: defaults.port,
            web_search_results: parse_var("WEB_SEARCH_RESULTS", defaults.web_search_results),
            knowledge_results: parse_var("KNOWLEDGE_RESULTS", defaults.knowledge_results),
            max_sessions: parse_var("MAX_SESSIONS", defaults.max_sessions),
            session_idle_secs: parse_var("SESSION_IDLE_SECS", defaults.session_idle_secs),
        }
    }
}

fn parse_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid value {:?} for {}", raw, name);
                default
            }
        },
        Err(_) => default,
    }
}

/// Chunking parameters as entered in the sidebar, clamped to the accepted ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingParams {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(CHUNK_SIZE_RANGE.0, CHUNK_SIZE_RANGE.1),
            overlap: overlap.clamp(OVERLAP_RANGE.0, OVERLAP_RANGE.1),
        }
    }

    pub fn from_form(chunk_size: Option<&str>, overlap: Option<&str>) -> Self {
        let parse = |v: Option<&str>, default: usize| {
            v.and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(default)
        };
        Self::new(parse(chunk_size, DEFAULT_CHUNK_SIZE), parse(overlap, DEFAULT_OVERLAP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_params_clamped() {
        assert_eq!(ChunkingParams::new(0, 0), ChunkingParams { chunk_size: 1, overlap: 1 });
        assert_eq!(
            ChunkingParams::new(9000, 4000),
            ChunkingParams { chunk_size: 5000, overlap: 1000 }
        );
        assert_eq!(ChunkingParams::new(800, 100), ChunkingParams { chunk_size: 800, overlap: 100 });
    }

    #[test]
    fn test_chunking_params_from_form() {
        assert_eq!(ChunkingParams::from_form(None, None), ChunkingParams::default());
        assert_eq!(
            ChunkingParams::from_form(Some(" 1500 "), Some("abc")),
            ChunkingParams { chunk_size: 1500, overlap: DEFAULT_OVERLAP }
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.collection, "law");
        assert_eq!(config.chat_model, "gemini-2.5-flash");
        assert_eq!(config.embedding_dimensions, 1536);
    }
}
