mod handlers;
mod views;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::AppConfig;
use crate::database::{ContentsDb, VectorStore};
use crate::providers::{CompletionProvider, GeminiProvider};
use crate::search::SearchProvider;
use crate::session::SessionStore;

pub use views::markdown_to_html;

/// Largest accepted upload, multipart overhead included.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Builds a completion provider for a session API key.
pub type ProviderFactory =
    Arc<dyn Fn(&str) -> anyhow::Result<Arc<dyn CompletionProvider>> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: Arc<dyn VectorStore>,
    pub(crate) contents: ContentsDb,
    pub(crate) sessions: SessionStore,
    pub(crate) web_search: Arc<dyn SearchProvider>,
    pub(crate) providers: ProviderFactory,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn VectorStore>,
        contents: ContentsDb,
        web_search: Arc<dyn SearchProvider>,
    ) -> Self {
        let sessions = SessionStore::new(config.api_key.clone()).with_limits(
            config.max_sessions,
            Duration::from_secs(config.session_idle_secs),
        );
        let config = Arc::new(config);
        let gemini_config = config.clone();
        let providers: ProviderFactory = Arc::new(move |api_key: &str| {
            let provider = GeminiProvider::new(api_key.to_string(), String::new(), &gemini_config)?;
            anyhow::Ok(Arc::new(provider) as Arc<dyn CompletionProvider>)
        });

        Self {
            config,
            store,
            contents,
            sessions,
            web_search,
            providers,
        }
    }

    pub fn with_provider_factory(mut self, providers: ProviderFactory) -> Self {
        self.providers = providers;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
    #[error("Invalid upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
        };
        log::error!("{}", self);
        (status, self.to_string()).into_response()
    }
}

/// Create and configure the web UI router
pub fn create_api(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(handlers::index))
        .route("/config", post(handlers::set_api_key))
        .route("/upload", post(handlers::upload))
        .route("/analyze", post(handlers::analyze))
        .route("/chat", post(handlers::chat))
        .route("/chat/clear", post(handlers::clear_chat))
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
