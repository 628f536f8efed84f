//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chatdoc::providers::{EmbeddingProvider, LanguageModel};
use chatdoc::{Document, ProviderError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const VOCAB_DIM: usize = 256;

/// Bag-of-words embedder over a growing vocabulary.
///
/// Each new lowercase word gets the next slot, so texts sharing words have
/// positive cosine similarity and texts sharing none score zero.
pub struct VocabEmbedder {
    dim: usize,
    vocab: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
}

impl VocabEmbedder {
    pub fn new() -> Self {
        Self::with_dim(VOCAB_DIM)
    }

    pub fn with_dim(dim: usize) -> Self {
        Self {
            dim,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocab = self.vocab.lock().unwrap();
        let mut vector = vec![0.0; self.dim];
        for word in words(text) {
            let next = vocab.len();
            let slot = *vocab.entry(word).or_insert(next) % self.dim;
            vector[slot] += 1.0;
        }
        vector
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for VocabEmbedder {
    fn name(&self) -> &str {
        "vocab"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Embedder returning constant vectors of a fixed dimension
pub struct ConstantEmbedder {
    pub dim: usize,
}

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    fn name(&self) -> &str {
        "constant"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|_| vec![1.0; self.dim]).collect())
    }
}

/// Wraps another embedder and fails only its `fail_on`-th call (1-based)
pub struct FailingEmbedder<E> {
    inner: E,
    fail_on: usize,
    calls: AtomicUsize,
}

impl<E> FailingEmbedder<E> {
    pub fn new(inner: E, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: EmbeddingProvider> EmbeddingProvider for FailingEmbedder<E> {
    fn name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(ProviderError::Status {
                status: 503,
                body: "embedding backend unavailable".to_string(),
            });
        }
        self.inner.embed(texts).await
    }
}

/// Wraps another embedder, sleeping inside every call and recording the
/// highest number of calls in flight at once
pub struct SlowEmbedder<E> {
    inner: E,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl<E> SlowEmbedder<E> {
    pub fn new(inner: E, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: EmbeddingProvider> EmbeddingProvider for SlowEmbedder<E> {
    fn name(&self) -> &str {
        "slow"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let result = self.inner.embed(texts).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Language model that answers with the prompt it was given and records
/// every prompt
pub struct EchoModel {
    prompts: Mutex<Vec<String>>,
}

impl EchoModel {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(prompt.to_string())
    }
}

pub fn medical_document() -> Document {
    Document::from_texts(
        "visit.txt",
        [
            "Patient has Type 2 diabetes, prescribed metformin.",
            "Follow-up in 3 months.",
        ],
    )
}

/// Document with one short page per entry of `lines`
pub fn document_of(source: &str, lines: &[&str]) -> Document {
    Document::from_texts(source, lines.iter().copied())
}
