//! Session state machine
//!
//! Valid transitions:
//! 1. Empty    → Indexing (on: BeginIngest)
//! 2. Ready    → Indexing (on: BeginIngest)
//! 3. Indexing → Ready    (on: IngestComplete)
//! 4. Indexing → Empty    (on: IngestFailed { had_index: false })
//! 5. Indexing → Ready    (on: IngestFailed { had_index: true })
//!
//! Anything else, in particular a second `BeginIngest` while indexing, is
//! rejected.

use serde::{Deserialize, Serialize};

use crate::errors::{RagError, Result};

/// Lifecycle of a session's index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    /// No index built yet
    Empty,
    /// An ingest is running
    Indexing,
    /// An index is installed and queries are accepted
    Ready,
}

/// Events that drive transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEvent {
    BeginIngest,
    IngestComplete,
    /// Roll back; `had_index` tells whether an older index is still installed
    IngestFailed { had_index: bool },
}

impl PipelineState {
    pub fn transition(&self, event: StateEvent) -> Result<PipelineState> {
        use PipelineState::*;
        use StateEvent::*;

        let next = match (self, event) {
            (Empty, BeginIngest) | (Ready, BeginIngest) => Indexing,
            (Indexing, IngestComplete) => Ready,
            (Indexing, IngestFailed { had_index: true }) => Ready,
            (Indexing, IngestFailed { had_index: false }) => Empty,
            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                })
            }
        };

        Ok(next)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineState::Ready)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineState::Empty => "No document",
            PipelineState::Indexing => "Indexing",
            PipelineState::Ready => "Ready",
        }
    }
}
