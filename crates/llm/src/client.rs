use async_trait::async_trait;
use reqwest::Client;
use saju_common::{Result, SajuError};
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{build_http_client, check_status, send_error};
use crate::llm_trait::LlmClient;
use crate::types::{GenerateRequest, OllamaGenerateRequest, OllamaGenerateResponse};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = build_http_client(timeout)?;

        info!("Ollama client initialized: {}", base_url);
        Ok(Self { base_url, client })
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&OllamaGenerateRequest::from(&request))
            .send()
            .await
            .map_err(|e| send_error("Ollama", e))?;
        let response = check_status("Ollama", response).await?;

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| SajuError::llm(format!("Failed to parse Ollama response: {}", e)))?;

        if result.response.trim().is_empty() {
            return Err(SajuError::llm("Empty response from Ollama"));
        }

        debug!(
            "Received response from Ollama - Model: {}, Length: {}, Done: {}",
            result.model,
            result.response.len(),
            result.done
        );
        Ok(result.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
