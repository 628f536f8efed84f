// End-to-end RAG pipeline: ingest and ask over an explicit session
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::document::Document;
use crate::errors::{RagError, Result};
use crate::providers::{EmbeddingProvider, LanguageModel};
use crate::rag::chunker::{Chunk, ChunkSplitter};
use crate::rag::embedding::{BatchEmbedder, DEFAULT_BATCH_SIZE};
use crate::rag::generation::AnswerGenerator;
use crate::rag::index::{IndexEntry, VectorIndex};
use crate::rag::retrieval::Retriever;
use crate::rag::session::{Session, SessionState};
use crate::rag::state::StateEvent;

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks
pub const DEFAULT_OVERLAP: usize = 200;

/// Default number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 4;

/// Per-ingest parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub overlap: usize,
    /// Chunks retrieved per question against this index
    pub top_k: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        ChunkSplitter::new(self.chunk_size, self.overlap)?;
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Summary of a successful ingest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub elapsed_ms: u64,
}

/// Answer plus the chunks it was grounded on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    /// Retrieved chunks, most similar first
    pub supporting_chunks: Vec<Chunk>,
    /// Similarity of each supporting chunk, same order
    pub scores: Vec<f32>,
    /// The model fell back on general knowledge
    pub used_general_knowledge: bool,
}

/// Orchestrates chunking, embedding, indexing, retrieval and generation
#[derive(Clone)]
pub struct RagPipeline {
    embedder: BatchEmbedder,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl RagPipeline {
    pub fn new(embedder: BatchEmbedder, generator: AnswerGenerator) -> Self {
        Self {
            retriever: Retriever::new(embedder.clone()),
            embedder,
            generator,
        }
    }

    /// Pipeline with default batching and prompt template
    pub fn with_providers(
        embedding: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        Ok(Self::new(
            BatchEmbedder::new(embedding, DEFAULT_BATCH_SIZE)?,
            AnswerGenerator::new(model),
        ))
    }

    /// Chunk, embed and index `document`, replacing the session's index.
    ///
    /// All-or-nothing: on any failure (or if the call is cancelled) the
    /// session keeps its previous state and index.
    pub async fn ingest(
        &self,
        session: &Session,
        document: &Document,
        config: &IngestConfig,
    ) -> Result<IngestReport> {
        config.validate()?;
        let started = Instant::now();

        let mut guard = session.lock().await;
        let expected_dim = guard.dimension;
        let had_index = guard.index.is_some();
        guard.state = guard.state.transition(StateEvent::BeginIngest)?;

        let mut rollback = Rollback {
            state: &mut *guard,
            had_index,
            armed: true,
        };

        info!(
            session = %session.id(),
            pages = document.page_count(),
            chunk_size = config.chunk_size,
            overlap = config.overlap,
            "ingesting document"
        );

        let index = match self.build_index(document, config, expected_dim).await {
            Ok(index) => index,
            Err(e) => {
                warn!(session = %session.id(), "ingest failed, keeping previous state: {}", e);
                return Err(e);
            }
        };

        let report = IngestReport {
            pages: document.page_count(),
            chunks: index.len(),
            dimension: index.dimension(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        let source = document.pages().first().map(|p| p.source_path.clone());
        rollback.commit(index, config.top_k, source)?;

        info!(
            session = %session.id(),
            chunks = report.chunks,
            dimension = report.dimension,
            elapsed_ms = report.elapsed_ms,
            "index ready"
        );
        Ok(report)
    }

    /// Answer `question` from the session's index.
    ///
    /// Fails with `NotReady` before a successful ingest, without calling
    /// any provider.
    pub async fn ask(&self, session: &Session, question: &str) -> Result<AnswerResponse> {
        let guard = session.lock().await;
        let index = match (&guard.index, guard.state.is_ready()) {
            (Some(index), true) => Arc::clone(index),
            _ => return Err(RagError::NotReady),
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::Config("question must not be empty".to_string()));
        }

        let retrieval = self.retriever.retrieve(&index, question, guard.top_k).await?;
        let scores = retrieval.hits.iter().map(|h| h.score).collect();
        let supporting_chunks = retrieval.into_chunks();

        let generated = self.generator.generate(question, &supporting_chunks).await?;
        info!(
            session = %session.id(),
            chunks = supporting_chunks.len(),
            general_knowledge = generated.used_general_knowledge,
            "answered question"
        );

        Ok(AnswerResponse {
            answer: generated.text,
            supporting_chunks,
            scores,
            used_general_knowledge: generated.used_general_knowledge,
        })
    }

    async fn build_index(
        &self,
        document: &Document,
        config: &IngestConfig,
        expected_dim: Option<usize>,
    ) -> Result<VectorIndex> {
        let splitter = ChunkSplitter::new(config.chunk_size, config.overlap)?;
        let chunks = splitter.split(document.pages());
        if chunks.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_all(&texts, expected_dim).await?;

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::new(chunk, vector))
            .collect();
        VectorIndex::build(entries)
    }

    pub fn embedder(&self) -> &BatchEmbedder {
        &self.embedder
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Apply one deadline to every provider call
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        let embedder = self.embedder.with_timeout(timeout);
        let generator = self.generator.with_timeout(timeout);
        Self::new(embedder, generator)
    }
}

/// Restores the pre-ingest state unless committed
struct Rollback<'a> {
    state: &'a mut SessionState,
    had_index: bool,
    armed: bool,
}

impl Rollback<'_> {
    fn commit(&mut self, index: VectorIndex, top_k: usize, source: Option<String>) -> Result<()> {
        self.state.state = self.state.state.transition(StateEvent::IngestComplete)?;
        self.state.dimension = Some(index.dimension());
        self.state.index = Some(Arc::new(index));
        self.state.top_k = top_k;
        self.state.source = source;
        self.armed = false;
        Ok(())
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if self.armed {
            let event = StateEvent::IngestFailed {
                had_index: self.had_index,
            };
            if let Ok(previous) = self.state.state.transition(event) {
                self.state.state = previous;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::rag::state::PipelineState;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Unit vector per text length bucket; counts calls
    struct LengthEmbedder {
        calls: AtomicUsize,
        dim: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        async fn embed(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; self.dim];
                    v[t.len() % self.dim] = 1.0;
                    v
                })
                .collect())
        }
    }

    /// Never answers within a test's patience
    struct StallingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StallingEmbedder {
        fn name(&self) -> &str {
            "stall"
        }

        async fn embed(&self, _texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError> {
            Ok(prompt.to_string())
        }
    }

    fn pipeline(dim: usize) -> (RagPipeline, Arc<LengthEmbedder>) {
        let embedder = Arc::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
            dim,
        });
        let pipeline = RagPipeline::with_providers(embedder.clone(), Arc::new(EchoModel)).unwrap();
        (pipeline, embedder)
    }

    #[test]
    fn test_ingest_config_default() {
        let config = IngestConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.overlap, 200);
        assert_eq!(config.top_k, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ingest_config_validation() {
        let bad_overlap = IngestConfig {
            chunk_size: 10,
            overlap: 10,
            top_k: 1,
        };
        assert!(matches!(bad_overlap.validate(), Err(RagError::Config(_))));

        let bad_k = IngestConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(bad_k.validate(), Err(RagError::Config(_))));
    }

    #[tokio::test]
    async fn test_ingest_then_ask() {
        let (pipeline, _) = pipeline(8);
        let session = Session::create();
        let doc = Document::from_texts("doc.txt", ["alpha beta", "gamma"]);

        let report = pipeline
            .ingest(&session, &doc, &IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(report.chunks, 2);
        assert_eq!(report.dimension, 8);
        assert_eq!(session.state().await, PipelineState::Ready);

        let response = pipeline.ask(&session, "alpha beta").await.unwrap();
        assert_eq!(response.supporting_chunks.len(), 2);
        assert_eq!(response.supporting_chunks[0].text, "alpha beta");
        assert_eq!(response.scores.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_document_is_empty_index() {
        let (pipeline, embedder) = pipeline(4);
        let session = Session::create();
        let doc = Document::from_texts("doc.txt", [""]);

        let err = pipeline
            .ingest(&session, &doc, &IngestConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyIndex));
        assert_eq!(session.state().await, PipelineState::Empty);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let (pipeline, _) = pipeline(4);
        let session = Session::create();
        let doc = Document::from_texts("doc.txt", ["text"]);
        pipeline
            .ingest(&session, &doc, &IngestConfig::default())
            .await
            .unwrap();

        let err = pipeline.ask(&session, "   ").await.unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[tokio::test]
    async fn test_cancelled_ingest_rolls_back() {
        let pipeline =
            RagPipeline::with_providers(Arc::new(StallingEmbedder), Arc::new(EchoModel)).unwrap();
        let session = Session::create();
        let doc = Document::from_texts("doc.txt", ["text"]);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(20),
            pipeline.ingest(&session, &doc, &IngestConfig::default()),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(session.state().await, PipelineState::Empty);
    }

    #[tokio::test]
    async fn test_operation_timeout_is_embedding_error() {
        let pipeline =
            RagPipeline::with_providers(Arc::new(StallingEmbedder), Arc::new(EchoModel))
                .unwrap()
                .with_timeout(Some(Duration::from_millis(20)));
        let session = Session::create();
        let doc = Document::from_texts("doc.txt", ["text"]);

        let err = pipeline
            .ingest(&session, &doc, &IngestConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Embedding(ProviderError::Timeout { duration_ms: 20 })
        ));
        assert_eq!(session.state().await, PipelineState::Empty);
    }
}
