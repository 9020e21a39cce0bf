use crate::types::GenerateRequest;
use async_trait::async_trait;
use saju_common::Result;

/// Black-box text generator: one prompt in, one text out
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate text from a prompt (single attempt)
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
