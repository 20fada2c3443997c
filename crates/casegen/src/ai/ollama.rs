use super::{ModelClient, ModelInfo, Provider};
use crate::prelude::*;
use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;

const SYSTEM_PREAMBLE: &str = "\
You are a test case generator. You receive a user story and output ONLY a JSON array.
No markdown fences. No explanations. No commentary.";

/// Ollama backend, driven through rig.
pub struct OllamaClient {
    client: ollama::Client,
    model: String,
    temperature: f64,
}

impl OllamaClient {
    pub fn new(ollama_url: &str, model: &str, temperature: f64) -> Result<Self> {
        Ok(Self {
            client: create_client(ollama_url)?,
            model: model.to_string(),
            temperature,
        })
    }
}

fn create_client(ollama_url: &str) -> Result<ollama::Client> {
    use rig::client::Nothing;

    ollama::Client::builder()
        .api_key(Nothing)
        .base_url(ollama_url)
        .build()
        .map_err(|e| eyre!("Failed to create Ollama client: {}", e))
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(SYSTEM_PREAMBLE)
            .temperature(self.temperature)
            .build();

        agent
            .prompt(prompt.to_string())
            .await
            .map_err(|e| eyre!("Model generation failed: {}", e))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            provider: Provider::Ollama,
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
