//! ChatDoc - Ask questions about a document
//!
//! Retrieval-augmented question answering over a single PDF or text file.
//!
//! # Architecture
//!
//! - **document**: loaders turning files into numbered pages
//! - **rag**: chunking, embedding, the in-memory vector index, retrieval,
//!   answer generation and the session-scoped pipeline
//! - **providers**: HTTP clients for embedding and language-model backends,
//!   plus retry decorators
//! - **cli** / **repl**: the `chatdoc` binary's argument parsing and chat loop

pub mod errors;
pub mod config;
pub mod logging;
pub mod document;
pub mod providers;
pub mod rag;
pub mod cli;
pub mod repl;

// Re-export commonly used types
pub use errors::{ProviderError, RagError, Result};
pub use document::{Document, Page};
pub use providers::{EmbeddingProvider, LanguageModel};
pub use rag::{AnswerResponse, IngestConfig, PipelineState, RagPipeline, Session};
