use async_trait::async_trait;
use reqwest::Client;
use saju_common::{Result, SajuError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::http::{build_http_client, check_status, send_error};
use crate::llm_trait::LlmClient;
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, GenerateRequest};

/// OpenAI-compatible chat completions client
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SajuError::config("OpenAI API key is empty"));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = build_http_client(timeout)?;

        info!("OpenAI client initialized: {}", base_url);
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(
            "Sending chat completion - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatCompletionRequest::from(&request))
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e))?;
        let response = check_status("OpenAI", response).await?;

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| SajuError::llm(format!("Failed to parse OpenAI response: {}", e)))?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SajuError::llm("OpenAI response has no choices"))?;

        if choice.finish_reason.as_deref() == Some("length") {
            warn!("OpenAI output was cut at the token limit");
        }
        if choice.message.content.trim().is_empty() {
            return Err(SajuError::llm("Empty response from OpenAI"));
        }

        debug!("Received chat completion - Length: {}", choice.message.content.len());
        Ok(choice.message.content)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
