//! Saju LLM integration
//!
//! Text generator clients (OpenAI-compatible and Ollama) with retry on transient failure

mod client;
mod http;
mod llm_trait;
mod openai_client;
mod retry;
mod types;

pub use client::OllamaClient;
pub use llm_trait::LlmClient;
pub use openai_client::OpenAiClient;
pub use retry::RetryingClient;
pub use types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, GenerateRequest,
    OllamaGenerateRequest, OllamaGenerateResponse, OllamaOptions,
};

use saju_common::{AppConfig, LlmProvider, Result, SajuError};
use std::sync::Arc;
use std::time::Duration;

/// Build the configured generator, wrapped with `generator_retries` retries
pub fn build_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.llm_timeout_secs);

    let inner: Arc<dyn LlmClient> = match config.llm_provider {
        LlmProvider::OpenAi => {
            let api_key = config.llm_api_key.as_deref().ok_or_else(|| {
                SajuError::config("SAJU_LLM_API_KEY is required for the openai provider")
            })?;
            Arc::new(OpenAiClient::new(&config.llm_base_url, api_key, timeout)?)
        }
        LlmProvider::Ollama => Arc::new(OllamaClient::new(&config.llm_base_url, timeout)?),
    };

    Ok(Arc::new(RetryingClient::new(inner, config.generator_retries)))
}
