//! # Types
//!
//! Core types for the reconciler.

use crate::controller::backoff::ExponentialBackoff;
use crate::controller::reconciler::reconcile::Engine;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Disposition returned by one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Nothing left to do until the resource changes
    Done,
    /// Re-read and retry at once (status write conflict)
    RequeueNow,
    /// Retry after a fixed delay (rate limited)
    RequeueAfter(Duration),
    /// Retriable failure; the trigger layer applies exponential backoff
    Backoff(String),
}

impl Directive {
    /// Label used in metrics
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Directive::Done => "done",
            Directive::RequeueNow => "requeue_now",
            Directive::RequeueAfter(_) => "requeue_after",
            Directive::Backoff(_) => "backoff",
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Reconciliation failed: {reason}")]
    RetryWithBackoff { reason: String },
}

/// Backoff state for a specific resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: ExponentialBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(start_ms: u64, max_ms: u64) -> Self {
        Self {
            backoff: ExponentialBackoff::new(start_ms, max_ms),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Controller context shared by every reconciliation
pub struct Reconciler {
    pub engine: Engine,
    /// Backoff state per resource (identified by namespace/name)
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
    pub backoff_start_ms: u64,
    pub backoff_max_ms: u64,
    /// Cancelled on shutdown; each reconciliation runs under a child token
    pub shutdown: CancellationToken,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("backoff_start_ms", &self.backoff_start_ms)
            .field("backoff_max_ms", &self.backoff_max_ms)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        engine: Engine,
        backoff_start_ms: u64,
        backoff_max_ms: u64,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
            backoff_start_ms,
            backoff_max_ms,
            shutdown,
        }
    }

    /// Forget the failure history of a resource after a non-backoff outcome
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }

    /// Drop the backoff entry of a resource whose cleanup finished
    pub fn forget_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }

    /// Record a failure and return the delay before the next attempt
    ///
    /// Falls back to the configured start delay when the state map is poisoned.
    pub fn next_backoff(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(|| BackoffState::new(self.backoff_start_ms, self.backoff_max_ms));
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(_) => (Duration::from_millis(self.backoff_start_ms), 0),
        }
    }
}
