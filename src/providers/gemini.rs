//! Google Generative Language embeddings client
//!
//! Endpoint: POST /v1beta/{model}:batchEmbedContents

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::ProviderError;
use crate::providers::{check_status, http_client, transport_error, EmbeddingProvider};

/// Default Generative Language API endpoint
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Embeddings via `batchEmbedContents`
#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GeminiEmbedder {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };

        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1beta/{}:batchEmbedContents", self.base_url, self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &self.model,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        };

        debug!(batch = texts.len(), model = %self.model, "gemini embed request");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let body: BatchEmbedResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(into_vectors(body))
    }
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

fn into_vectors(response: BatchEmbedResponse) -> Vec<Vec<f32>> {
    response.embeddings.into_iter().map(|e| e.values).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_prefix_added() {
        let embedder = GeminiEmbedder::new(
            DEFAULT_GEMINI_URL,
            "embedding-001",
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(embedder.model(), "models/embedding-001");
        assert_eq!(embedder.name(), "models/embedding-001");
    }

    #[test]
    fn test_request_shape() {
        let texts = vec!["hello".to_string()];
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: DEFAULT_EMBEDDING_MODEL,
                    content: Content {
                        parts: vec![Part { text }],
                    },
                })
                .collect(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requests"][0]["model"], "models/embedding-001");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_parse_response() {
        let body: BatchEmbedResponse = serde_json::from_str(
            r#"{"embeddings":[{"values":[0.1,0.2]},{"values":[0.3,0.4]}]}"#,
        )
        .unwrap();
        let vectors = into_vectors(body);
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[1], vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let embedder = GeminiEmbedder::new(
            "http://127.0.0.1:9",
            DEFAULT_EMBEDDING_MODEL,
            "key".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
