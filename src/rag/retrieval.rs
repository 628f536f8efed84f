// Query-side retrieval: embed the question, then search the index
use tracing::debug;

use crate::errors::Result;
use crate::rag::embedding::BatchEmbedder;
use crate::rag::index::{RetrievalResult, VectorIndex};

/// Fetches the top-k chunks for a query
#[derive(Clone)]
pub struct Retriever {
    embedder: BatchEmbedder,
}

impl Retriever {
    pub fn new(embedder: BatchEmbedder) -> Self {
        Self { embedder }
    }

    /// Embed `query` with a single-item call and search `index`.
    ///
    /// Fails with whatever the embedder or the index fail with.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        let vector = self.embedder.embed_one(query).await?;
        let result = index.query(&vector, k)?;

        debug!(
            k,
            hits = result.len(),
            best = result.hits.first().map(|h| h.score).unwrap_or(0.0),
            "retrieved chunks"
        );
        Ok(result)
    }
}
