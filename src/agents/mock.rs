use crate::providers::CompletionProvider;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

type Responder = dyn Fn(&str, &str) -> String + Send + Sync;

/// Answers with a closure over (system message, prompt) and records every
/// completion. Clones share the log and the responder.
pub(crate) struct MockProvider {
    system_message: RwLock<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
    respond: Arc<Responder>,
}

impl MockProvider {
    pub(crate) fn new<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            system_message: RwLock::new(String::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

/// Agent name taken from a "You are X." system message.
pub(crate) fn agent_name(system: &str) -> &str {
    system
        .strip_prefix("You are ")
        .and_then(|rest| rest.split('.').next())
        .unwrap_or("")
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let system = self.system_message.read().clone();
        let reply = (self.respond)(&system, prompt);
        self.calls.lock().push((system, prompt.to_string()));
        Ok(reply)
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        Ok(['a', 'e', 'o']
            .iter()
            .map(|l| text.chars().filter(|c| c == l).count() as f32 + 1.0)
            .collect())
    }

    fn update_system_message(&self, system_message: String) {
        *self.system_message.write() = system_message;
    }

    fn get_system_message(&self) -> String {
        self.system_message.read().clone()
    }

    fn get_model_info(&self) -> String {
        "mock".to_string()
    }

    fn clone_with_system_message(&self, system_message: &str) -> Box<dyn CompletionProvider> {
        Box::new(Self {
            system_message: RwLock::new(system_message.to_string()),
            calls: self.calls.clone(),
            respond: self.respond.clone(),
        })
    }
}
