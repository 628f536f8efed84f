//! Retrieval-augmented generation core
//!
//! Ingest path: pages → chunks → embeddings → index.
//! Query path: question → embedding → top-k chunks → prompt → answer.
//!
//! Components:
//! - `chunker`: fixed-window splitting with overlap
//! - `embedding`: batched, dimension-checked embedding calls
//! - `index`: exact cosine-similarity index
//! - `retrieval`: query embedding + index lookup
//! - `generation`: prompt template + single model call
//! - `session` / `state`: explicit session and its state machine
//! - `pipeline`: ingest/ask orchestration

pub mod chunker;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod session;
pub mod state;

// Re-export key types
pub use chunker::{Chunk, ChunkMetadata, ChunkSplitter};
pub use embedding::BatchEmbedder;
pub use generation::{AnswerGenerator, GeneratedAnswer, PromptTemplate};
pub use index::{IndexEntry, RetrievalResult, ScoredChunk, VectorIndex};
pub use pipeline::{AnswerResponse, IngestConfig, IngestReport, RagPipeline};
pub use retrieval::Retriever;
pub use session::{Session, SessionInfo};
pub use state::{PipelineState, StateEvent};
