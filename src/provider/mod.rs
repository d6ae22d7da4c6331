//! # Provider
//!
//! The remote sync port and its Fleet Management implementation.
//!
//! The reconciler talks to Fleet Management only through [`PipelineSyncPort`],
//! so tests can substitute an in-memory double.

pub mod fleet;

use async_trait::async_trait;
use fleet::{RemotePipeline, UpsertPipelineRequest};
use thiserror::Error;

/// Failure of a remote pipeline call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Fleet Management answered with a non-success status
    #[error("{operation} failed with HTTP {status}: {message}")]
    Api {
        status: u16,
        operation: String,
        message: String,
    },
    /// Connect, timeout, or decode failure
    #[error("transport error: {0}")]
    Transport(String),
    /// The invocation's cancellation scope ended before the call completed
    #[error("remote call cancelled")]
    Cancelled,
}

impl SyncError {
    /// HTTP status for structured API errors
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Api { status, .. } => Some(*status),
            SyncError::Transport(_) | SyncError::Cancelled => None,
        }
    }
}

/// Remote side of pipeline reconciliation
#[async_trait]
pub trait PipelineSyncPort: Send + Sync {
    /// Create or fully replace a pipeline, keyed by name and source
    async fn upsert_pipeline(
        &self,
        request: &UpsertPipelineRequest,
    ) -> Result<RemotePipeline, SyncError>;

    /// Delete a pipeline by ID; a missing pipeline counts as deleted
    async fn delete_pipeline(&self, id: &str) -> Result<(), SyncError>;
}
