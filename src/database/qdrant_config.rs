use log::{error, info};
use qdrant_client::{config::QdrantConfig, Qdrant};
use std::time::Duration;
use url::Url;

/// Qdrant's REST port is 6333; the client speaks gRPC on 6334.
pub fn grpc_url(url: &str) -> Result<String, String> {
    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };

    let mut parsed = Url::parse(&with_scheme).map_err(|e| format!("Invalid Qdrant URL {}: {}", url, e))?;
    if parsed.port() == Some(6333) {
        parsed
            .set_port(Some(6334))
            .map_err(|_| format!("Invalid Qdrant URL {}", url))?;
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub async fn create_qdrant_client(url: &str) -> Result<Qdrant, String> {
    let grpc_url = grpc_url(url)?;
    info!("Attempting to connect to Qdrant with URL: {}", grpc_url);

    let mut config = QdrantConfig::from_url(&grpc_url);
    config.timeout = Duration::from_secs(30);
    config.connect_timeout = Duration::from_secs(5);

    let client = Qdrant::new(config).map_err(|e| format!("Failed to build Qdrant client: {}", e))?;

    match client.list_collections().await {
        Ok(_) => {
            info!("Successfully connected to Qdrant");
            Ok(client)
        }
        Err(e) => {
            error!("Connection test failed: {}", e);
            Err(format!("Failed to connect to Qdrant: {}", e))
        }
    }
}
