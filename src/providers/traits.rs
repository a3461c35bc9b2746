use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;

    async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.generate_embedding(text).await?);
        }
        Ok(embeddings)
    }

    fn update_system_message(&self, system_message: String);

    fn get_system_message(&self) -> String;

    fn get_model_info(&self) -> String;

    /// Same backend and credentials, independent system message.
    fn clone_with_system_message(&self, system_message: &str) -> Box<dyn CompletionProvider>;
}
