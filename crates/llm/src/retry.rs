use async_trait::async_trait;
use saju_common::{Result, SajuError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::llm_trait::LlmClient;
use crate::types::GenerateRequest;

/// Retries transient generator failures with the same request
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingClient {
    /// `max_retries` extra attempts after the first; backoff doubles from 1s
    pub fn new(inner: Arc<dyn LlmClient>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let attempts = self.max_retries + 1;
        let mut last_error: Option<SajuError> = None;

        for attempt in 1..=attempts {
            match self.inner.generate(request.clone()).await {
                Ok(text) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}/{}", self.inner.name(), attempt, attempts);
                    }
                    return Ok(text);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempt < attempts {
                        let delay = self.base_delay * 2u32.pow(attempt - 1);
                        warn!(
                            "{} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            self.inner.name(),
                            attempt,
                            attempts,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SajuError::llm("All retries failed")))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
