use clap::Parser;
use dotenv::dotenv;
use log::{info, warn};
use rust_legal_agent::api::{self, AppState};
use rust_legal_agent::config::AppConfig;
use rust_legal_agent::database::{connect_vector_store, ContentsDb};
use rust_legal_agent::search::DuckDuckGoProvider;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gemini API key used by sessions that have not entered their own
    #[arg(short, long)]
    api_key: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    qdrant_url: Option<String>,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid listen address: {0}")]
    AddressError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(key) = args.api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = Some(key);
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.qdrant_url {
        config.qdrant_url = url;
    }

    run_server(config).await?;
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::AddressError(format!("{}:{} ({})", config.host, config.port, e)))?;

    if config.api_key.is_none() {
        warn!("No API key configured; each session must enter one before uploading");
    }

    let store = connect_vector_store(&config).await;
    let contents = ContentsDb::open_or_in_memory(&config.contents_db_path)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

    info!(
        "Using {} vector store, collection {:?}, chat model {}",
        store.backend(),
        config.collection,
        config.chat_model
    );

    let state = AppState::new(config, store, contents, Arc::new(DuckDuckGoProvider::new()));
    let app = api::create_api(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::ServerError(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("Legal team UI listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::ServerError(e.to_string()))?;

    Ok(())
}
