//! Embedding and language-model backends
//!
//! The core only sees two capabilities: turning texts into vectors and
//! turning a prompt into text. HTTP clients for Gemini, Groq and Ollama
//! implement them; tests substitute deterministic fakes.

pub mod gemini;
pub mod groq;
pub mod ollama;
pub mod retry;

pub use gemini::GeminiEmbedder;
pub use groq::GroqChatModel;
pub use ollama::{OllamaEmbedder, OllamaModel};
pub use retry::{RetryPolicy, RetryingEmbedder, RetryingModel};

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::ProviderError;

/// Maps texts to fixed-dimensional vectors, one per input, in order
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider/model identifier used in logs
    fn name(&self) -> &str;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Single-shot text completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider/model identifier used in logs
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Read an API key from the named environment variable
pub fn api_key_from_env(var: &str) -> Result<String, ProviderError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ProviderError::MissingCredential(var.to_string())),
    }
}

/// Build the shared reqwest client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Http)
}

/// Turn a non-success response into `ProviderError::Status`
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ProviderError::Status { status, body })
}

/// Map reqwest timeouts onto `ProviderError::Timeout`
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        }
    } else {
        ProviderError::Http(err)
    }
}

/// Bound a provider call by an optional deadline
pub(crate) async fn with_deadline<T, F>(
    deadline: Option<Duration>,
    call: F,
) -> Result<T, ProviderError>
where
    F: std::future::Future<Output = Result<T, ProviderError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(ProviderError::Timeout {
                duration_ms: limit.as_millis() as u64,
            })),
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let err = api_key_from_env("CHATDOC_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_deadline_expires() {
        let result: Result<(), ProviderError> =
            with_deadline(Some(Duration::from_millis(10)), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ProviderError::Timeout { duration_ms: 10 })));
    }

    #[tokio::test]
    async fn test_no_deadline_passes_through() {
        let result = with_deadline(None, async { Ok::<_, ProviderError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
