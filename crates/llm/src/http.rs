use reqwest::{Client, Response, StatusCode};
use saju_common::{Result, SajuError};
use std::time::Duration;

use crate::types::ApiErrorBody;

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SajuError::config(format!("Failed to create HTTP client: {}", e)))
}

/// Transport failures are transient, timeouts included
pub(crate) fn send_error(backend: &str, error: reqwest::Error) -> SajuError {
    if error.is_timeout() {
        SajuError::network(format!("{} request timed out: {}", backend, error))
    } else {
        SajuError::network(format!("Failed to send request to {}: {}", backend, error))
    }
}

/// Map a non-success response to an error.
///
/// 429 and 5xx stay retryable; rejected credentials and malformed requests do not.
pub(crate) async fn check_status(backend: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    Err(classify_status(backend, status, &detail))
}

pub(crate) fn classify_status(backend: &str, status: StatusCode, detail: &str) -> SajuError {
    let message = format!("{} API error ({}): {}", backend, status, detail.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SajuError::config(message),
        StatusCode::TOO_MANY_REQUESTS => SajuError::llm(message),
        s if s.is_server_error() => SajuError::llm(message),
        _ => SajuError::generator_rejected(message),
    }
}
