//! Client port for the external AI service.
//!
//! The AI service is an external collaborator; the application must start
//! and serve everything else when it is not configured.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the AI service.
#[derive(Debug, Error)]
pub enum AiError {
    /// The service is unreachable, timed out, or not configured.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
}

/// Port for forwarding chat requests to the AI service.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Forwards a chat payload and returns the service's JSON reply.
    async fn chat(&self, payload: serde_json::Value) -> Result<serde_json::Value, AiError>;
}

/// HTTP client for a configured AI service.
#[derive(Clone)]
pub struct HttpAiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAiClient {
    /// Creates a client with the given base URL and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AiClient for HttpAiClient {
    async fn chat(&self, payload: serde_json::Value) -> Result<serde_json::Value, AiError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AiError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AiError::Unavailable(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| AiError::Unavailable(e.to_string()))
    }
}

/// Client used when no AI service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAiClient;

#[async_trait]
impl AiClient for DisabledAiClient {
    async fn chat(&self, _payload: serde_json::Value) -> Result<serde_json::Value, AiError> {
        Err(AiError::Unavailable("AI service not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_is_always_unavailable() {
        let client = DisabledAiClient;
        let result = client.chat(serde_json::json!({"message": "hi"})).await;
        assert!(matches!(result, Err(AiError::Unavailable(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpAiClient::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
