//! Ollama API client for local embeddings and generation
//!
//! - Embeddings: POST /api/embed (batched `input`)
//! - Generation: POST /api/generate with `stream: false`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::errors::ProviderError;
use crate::providers::{
    check_status, http_client, transport_error, EmbeddingProvider, LanguageModel,
};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default embedding model
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

/// Connection shared by both Ollama capabilities
#[derive(Debug, Clone)]
struct OllamaConnection {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaConnection {
    fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;
        check_status(response).await
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Text generation through a local Ollama model
#[derive(Debug, Clone)]
pub struct OllamaModel {
    conn: OllamaConnection,
}

impl OllamaModel {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            conn: OllamaConnection::new(base_url, model, timeout)?,
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        self.conn.health_check().await
    }

    pub fn base_url(&self) -> &str {
        &self.conn.base_url
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        &self.conn.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateRequest {
            model: &self.conn.model,
            prompt,
            stream: false,
        };

        debug!(model = %self.conn.model, "ollama generate request");
        let body: GenerateResponse = self
            .conn
            .post("/api/generate", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(body.response)
    }
}

/// Embeddings through a local Ollama model
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    conn: OllamaConnection,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            conn: OllamaConnection::new(base_url, model, timeout)?,
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> bool {
        self.conn.health_check().await
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn name(&self) -> &str {
        &self.conn.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.conn.model,
            input: texts,
        };

        debug!(batch = texts.len(), model = %self.conn.model, "ollama embed request");
        let body: EmbedResponse = self
            .conn
            .post("/api/embed", &request)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        Ok(body.embeddings)
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama embed request
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
}
