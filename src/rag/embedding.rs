// Batched, dimension-checked embedding
//
// Wraps an `EmbeddingProvider` so that ingest issues one call per batch and
// every returned vector is validated before it can reach an index.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{ProviderError, RagError, Result};
use crate::providers::{with_deadline, EmbeddingProvider};

/// Default texts per provider call (Gemini's batchEmbedContents limit)
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Batching front for an embedding provider
#[derive(Clone)]
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    timeout: Option<Duration>,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(RagError::Config(
                "embedding batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            provider,
            batch_size,
            timeout: None,
        })
    }

    /// Bound each provider call
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Embed all `texts` in batches, one vector per text, in order.
    ///
    /// Every vector must share one dimensionality; when `expected_dim` is
    /// given (an earlier ingest in the same session fixed it) vectors must
    /// match it too. Any violation fails the whole call.
    pub async fn embed_all(
        &self,
        texts: &[String],
        expected_dim: Option<usize>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        let mut dimension = expected_dim;

        for (batch_no, batch) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                batch = batch_no + 1,
                size = batch.len(),
                provider = self.provider.name(),
                "embedding batch"
            );

            let batch_vectors = self.call(batch).await?;
            for vector in batch_vectors {
                let dim = *dimension.get_or_insert(vector.len());
                check_vector(&vector, dim).map_err(RagError::Embedding)?;
                vectors.push(vector);
            }
        }

        Ok(vectors)
    }

    /// Embed a single text (query path); dimensionality is left to the index
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.call(&[text.to_string()]).await?;
        let vector = vectors.pop().unwrap_or_default();
        if vector.is_empty() {
            return Err(RagError::Embedding(ProviderError::Malformed(
                "provider returned an empty vector".to_string(),
            )));
        }
        Ok(vector)
    }

    async fn call(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = with_deadline(self.timeout, self.provider.embed(batch))
            .await
            .map_err(RagError::Embedding)?;

        if vectors.len() != batch.len() {
            return Err(RagError::Embedding(ProviderError::CountMismatch {
                expected: batch.len(),
                actual: vectors.len(),
            }));
        }
        Ok(vectors)
    }
}

fn check_vector(vector: &[f32], expected: usize) -> std::result::Result<(), ProviderError> {
    if vector.is_empty() {
        return Err(ProviderError::Malformed(
            "provider returned an empty vector".to_string(),
        ));
    }
    if vector.len() != expected {
        return Err(ProviderError::InconsistentDimension {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}
