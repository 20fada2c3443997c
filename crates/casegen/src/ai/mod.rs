//! Generation collaborators: the LLM backends that turn a prompt into text.

mod gemini;
mod ollama;

use crate::prelude::*;
use async_trait::async_trait;
use casegen_core::testcase::{build_prompt, parse_test_cases, TestCase};
use serde::Serialize;
use std::sync::Arc;

pub use gemini::{GeminiClient, GEMINI_API_BASE};
pub use ollama::OllamaClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini over the public REST API
    Gemini,
    /// A local Ollama server
    Ollama,
}

impl Provider {
    /// Model used when `--model` is not given.
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-pro",
            Provider::Ollama => "llama3.1",
        }
    }
}

/// Model configuration reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub provider: Provider,
    pub model: String,
    pub temperature: f64,
}

/// A text-completion backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn info(&self) -> ModelInfo;
}

/// Ask the model for test cases covering `user_story`.
///
/// Provider errors and unparseable output both surface as errors carrying the
/// underlying message.
pub async fn generate_test_cases(
    client: &dyn ModelClient,
    user_story: &str,
) -> Result<Vec<TestCase>> {
    let prompt = build_prompt(user_story);
    log::debug!("Prompt length: {} chars", prompt.len());

    let response = client.complete(&prompt).await?;
    log::debug!("Model response length: {} chars", response.len());

    parse_test_cases(&response).map_err(|e| eyre!("{e}"))
}

#[derive(Debug, Clone, clap::Args)]
pub struct AiOptions {
    /// LLM provider used to generate test cases
    #[arg(long, env = "CASEGEN_PROVIDER", value_enum, default_value = "gemini")]
    pub provider: Provider,

    /// Model name [default: gemini-2.5-pro for gemini, llama3.1 for ollama]
    #[arg(long, env = "CASEGEN_MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (0 = deterministic)
    #[arg(long, env = "CASEGEN_TEMPERATURE", default_value = "0")]
    pub temperature: f64,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini models endpoint
    #[arg(long, env = "GEMINI_BASE_URL", default_value = GEMINI_API_BASE)]
    pub gemini_base_url: String,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,
}

impl AiOptions {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .unwrap_or(self.provider.default_model())
    }

    /// Build the configured backend.
    pub fn build_client(&self) -> Result<Arc<dyn ModelClient>> {
        match self.provider {
            Provider::Gemini => {
                let api_key = self
                    .gemini_api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| {
                        Error::MissingConfig(
                            "GEMINI_API_KEY is required for the gemini provider".to_string(),
                        )
                    })?;
                Ok(Arc::new(GeminiClient::new(
                    &self.gemini_base_url,
                    api_key,
                    self.model(),
                    self.temperature,
                )?))
            }
            Provider::Ollama => Ok(Arc::new(OllamaClient::new(
                &self.ollama_url,
                self.model(),
                self.temperature,
            )?)),
        }
    }
}
