//! Explicit session object
//!
//! A session owns at most one index. Every pipeline call takes the session
//! it operates on and holds its lock for the whole call, so ingests and
//! questions against one session never interleave. Sessions share nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::rag::index::VectorIndex;
use crate::rag::state::PipelineState;

/// Mutable part of a session, guarded by the session lock
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) state: PipelineState,
    pub(crate) index: Option<Arc<VectorIndex>>,
    /// Embedding dimensionality fixed by the first successful ingest
    pub(crate) dimension: Option<usize>,
    pub(crate) top_k: usize,
    pub(crate) source: Option<String>,
}

/// Point-in-time view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub state: PipelineState,
    pub chunk_count: usize,
    pub dimension: Option<usize>,
    pub top_k: usize,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One interactive session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    inner: Mutex<SessionState>,
}

impl Session {
    /// Start a session in the `Empty` state
    pub fn create() -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, "session created");
        Self {
            id,
            created_at: Utc::now(),
            inner: Mutex::new(SessionState {
                state: PipelineState::Empty,
                index: None,
                dimension: None,
                top_k: 0,
                source: None,
            }),
        }
    }

    /// End the session and drop its index
    pub fn destroy(self) {
        let chunks = self.inner.into_inner().index.map_or(0, |index| index.len());
        debug!(session = %self.id, chunks, "session destroyed");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state (waits for a running operation to finish)
    pub async fn state(&self) -> PipelineState {
        self.inner.lock().await.state
    }

    pub async fn info(&self) -> SessionInfo {
        let inner = self.inner.lock().await;
        SessionInfo {
            id: self.id,
            state: inner.state,
            chunk_count: inner.index.as_ref().map_or(0, |i| i.len()),
            dimension: inner.dimension,
            top_k: inner.top_k,
            source: inner.source.clone(),
            created_at: self.created_at,
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().await
    }
}
