//! Configuration management for ChatDoc
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.chatdoc/config.toml
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. API keys never live in the file: the file names the
//! environment variables that hold them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{RagError, Result};
use crate::providers::{
    api_key_from_env, gemini, groq, ollama, EmbeddingProvider, GeminiEmbedder, GroqChatModel,
    LanguageModel, OllamaEmbedder, OllamaModel, RetryPolicy, RetryingEmbedder, RetryingModel,
};
use crate::rag::embedding::{BatchEmbedder, DEFAULT_BATCH_SIZE};
use crate::rag::generation::{AnswerGenerator, PromptTemplate};
use crate::rag::pipeline::{IngestConfig, RagPipeline, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, DEFAULT_TOP_K};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetryConfig,
    pub prompt: PromptConfig,
    pub logging: LoggingConfig,
}

/// Language-model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    Groq,
    Ollama,
}

/// Embedding backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Gemini,
    Ollama,
}

/// Language-model connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmBackend,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

/// Embedding connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
}

/// Chunking and retrieval tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    pub top_k: usize,
    /// Deadline applied to every provider call by the pipeline
    pub operation_timeout_secs: Option<u64>,
}

/// Caller-side retry of provider calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call, first one included; 1 disables retries
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Prompt template override
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Must contain `{context}` and `{input}`
    pub template: Option<String>,
}

/// Log levels, overridden by `RUST_LOG`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default: String,
    /// Per-module levels, e.g. `"chatdoc::rag" = "debug"`
    pub modules: BTreeMap<String, String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::Groq,
            base_url: None,
            model: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: None,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Gemini,
            base_url: None,
            model: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_secs: 60,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            top_k: DEFAULT_TOP_K,
            operation_timeout_secs: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: "warn".to_string(),
            modules: BTreeMap::new(),
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            LlmBackend::Groq => groq::DEFAULT_CHAT_MODEL,
            LlmBackend::Ollama => ollama::DEFAULT_MODEL,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(match self.provider {
            LlmBackend::Groq => groq::DEFAULT_GROQ_URL,
            LlmBackend::Ollama => ollama::DEFAULT_OLLAMA_URL,
        })
    }

    /// Instantiate the configured backend
    pub fn build(&self) -> Result<Arc<dyn LanguageModel>> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let model: Arc<dyn LanguageModel> = match self.provider {
            LlmBackend::Groq => {
                let key = api_key_from_env(&self.api_key_env)
                    .map_err(|e| RagError::Config(e.to_string()))?;
                let mut client = GroqChatModel::new(self.base_url(), self.model(), key, timeout)
                    .map_err(|e| RagError::Config(e.to_string()))?;
                if let Some(temperature) = self.temperature {
                    client = client.with_temperature(temperature);
                }
                Arc::new(client)
            }
            LlmBackend::Ollama => Arc::new(
                OllamaModel::new(self.base_url(), self.model(), timeout)
                    .map_err(|e| RagError::Config(e.to_string()))?,
            ),
        };
        Ok(model)
    }
}

impl EmbeddingConfig {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            EmbeddingBackend::Gemini => gemini::DEFAULT_EMBEDDING_MODEL,
            EmbeddingBackend::Ollama => ollama::DEFAULT_EMBED_MODEL,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(match self.provider {
            EmbeddingBackend::Gemini => gemini::DEFAULT_GEMINI_URL,
            EmbeddingBackend::Ollama => ollama::DEFAULT_OLLAMA_URL,
        })
    }

    /// Instantiate the configured backend
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let embedder: Arc<dyn EmbeddingProvider> = match self.provider {
            EmbeddingBackend::Gemini => {
                let key = api_key_from_env(&self.api_key_env)
                    .map_err(|e| RagError::Config(e.to_string()))?;
                Arc::new(
                    GeminiEmbedder::new(self.base_url(), self.model(), key, timeout)
                        .map_err(|e| RagError::Config(e.to_string()))?,
                )
            }
            EmbeddingBackend::Ollama => Arc::new(
                OllamaEmbedder::new(self.base_url(), self.model(), timeout)
                    .map_err(|e| RagError::Config(e.to_string()))?,
            ),
        };
        Ok(embedder)
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chatdoc").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.ingest_config().validate()?;

        if self.embedding.batch_size == 0 {
            return Err(RagError::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 || self.embedding.timeout_secs == 0 {
            return Err(RagError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(RagError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if let Some(template) = &self.prompt.template {
            PromptTemplate::new(template.clone())?;
        }

        Ok(())
    }

    /// Chunking and retrieval parameters for `RagPipeline::ingest`
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            chunk_size: self.pipeline.chunk_size,
            overlap: self.pipeline.overlap,
            top_k: self.pipeline.top_k,
        }
    }

    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        match &self.prompt.template {
            Some(template) => PromptTemplate::new(template.clone()),
            None => Ok(PromptTemplate::default()),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_config(self.retry.max_attempts, self.retry.base_delay_ms)
    }

    /// Wire configured providers into a pipeline.
    ///
    /// Retries wrap the providers outside the core when `max_attempts > 1`.
    pub fn build_pipeline(&self) -> Result<RagPipeline> {
        self.validate()?;

        let mut embedding = self.embedding.build()?;
        let mut model = self.llm.build()?;
        if self.retry.max_attempts > 1 {
            embedding = Arc::new(RetryingEmbedder::new(embedding, self.retry_policy()));
            model = Arc::new(RetryingModel::new(model, self.retry_policy()));
        }

        self.pipeline_with(embedding, model)
    }

    /// Pipeline over caller-supplied providers, honoring batching, template
    /// and timeout settings
    pub fn pipeline_with(
        &self,
        embedding: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<RagPipeline> {
        let embedder = BatchEmbedder::new(embedding, self.embedding.batch_size)?;
        let generator = AnswerGenerator::with_template(model, self.prompt_template()?);
        let timeout = self.pipeline.operation_timeout_secs.map(Duration::from_secs);

        Ok(RagPipeline::new(embedder, generator).with_timeout(timeout))
    }

    /// Pretty TOML for display
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))
    }
}
