use crate::config::AppConfig;
use crate::providers::traits::CompletionProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on requests per `batchEmbedContents` call.
const MAX_EMBED_BATCH: usize = 100;

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    system_message: Arc<RwLock<String>>,
    client: Client,
    model: String,
    embedding_model: String,
    embedding_dimensions: usize,
    api_base: String,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(api_key: String, system_message: String, config: &AppConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(anyhow!("Gemini API key is missing"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()?;

        Ok(Self {
            api_key,
            system_message: Arc::new(RwLock::new(system_message)),
            client,
            model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            embedding_dimensions: config.embedding_dimensions,
            api_base: config.api_base.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.api_base, model, method)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("API request failed: Status {}, Body: {}", status, error_text));
        }

        let response_json: Value = response.json().await?;
        if let Some(error) = response_json.get("error") {
            return Err(anyhow!("API returned error: {}", error));
        }
        Ok(response_json)
    }

    fn embedding_request(&self, text: &str, task_type: &str) -> Value {
        json!({
            "model": format!("models/{}", self.embedding_model),
            "content": { "parts": [{ "text": text }] },
            "taskType": task_type,
            "outputDimensionality": self.embedding_dimensions,
        })
    }

    fn check_dimensions(&self, values: Vec<f32>) -> Result<Vec<f32>> {
        if values.len() != self.embedding_dimensions {
            return Err(anyhow!(
                "Generated embedding has wrong size: {} (expected {})",
                values.len(),
                self.embedding_dimensions
            ));
        }
        Ok(values)
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let system_message = self.system_message.read().clone();

        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": { "temperature": self.temperature }
        });
        if !system_message.trim().is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_message }] });
        }

        debug!("Gemini completion with {} ({} prompt chars)", self.model, prompt.len());
        let response_json = self.post(&self.endpoint(&self.model, "generateContent"), &body).await?;
        extract_text(&response_json)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let body = self.embedding_request(text, "RETRIEVAL_QUERY");
        let response_json = self
            .post(&self.endpoint(&self.embedding_model, "embedContent"), &body)
            .await?;

        let values = parse_values(&response_json["embedding"])
            .ok_or_else(|| anyhow!("Invalid embedding response format"))?;
        self.check_dimensions(values)
    }

    // Ingestion path, so documents are embedded as RETRIEVAL_DOCUMENT.
    async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_EMBED_BATCH) {
            let requests: Vec<Value> = batch
                .iter()
                .map(|text| self.embedding_request(text, "RETRIEVAL_DOCUMENT"))
                .collect();
            let response_json = self
                .post(
                    &self.endpoint(&self.embedding_model, "batchEmbedContents"),
                    &json!({ "requests": requests }),
                )
                .await?;

            let returned = response_json["embeddings"]
                .as_array()
                .ok_or_else(|| anyhow!("Invalid batch embedding response format"))?;
            if returned.len() != batch.len() {
                return Err(anyhow!(
                    "Batch embedding returned {} vectors for {} inputs",
                    returned.len(),
                    batch.len()
                ));
            }

            for embedding in returned {
                let values = parse_values(embedding)
                    .ok_or_else(|| anyhow!("Invalid batch embedding response format"))?;
                embeddings.push(self.check_dimensions(values)?);
            }
        }

        Ok(embeddings)
    }

    fn update_system_message(&self, system_message: String) {
        *self.system_message.write() = system_message;
    }

    fn get_system_message(&self) -> String {
        self.system_message.read().clone()
    }

    fn get_model_info(&self) -> String {
        self.model.clone()
    }

    fn clone_with_system_message(&self, system_message: &str) -> Box<dyn CompletionProvider> {
        Box::new(Self {
            system_message: Arc::new(RwLock::new(system_message.to_string())),
            ..self.clone()
        })
    }
}

fn extract_text(response_json: &Value) -> Result<String> {
    let Some(candidate) = response_json
        .get("candidates")
        .and_then(|c| c.get(0))
    else {
        if let Some(reason) = response_json["promptFeedback"]["blockReason"].as_str() {
            return Err(anyhow!("Prompt blocked by Gemini: {}", reason));
        }
        return Err(anyhow!("Invalid response format"));
    };

    match candidate["content"]["parts"].as_array() {
        Some(parts) => Ok(parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join("")),
        // A finished candidate without parts (e.g. MAX_TOKENS, SAFETY) has no content.
        None if candidate.get("finishReason").is_some() => Ok(String::new()),
        None => Err(anyhow!("Invalid response format")),
    }
}

fn parse_values(embedding: &Value) -> Option<Vec<f32>> {
    embedding["values"]
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}
