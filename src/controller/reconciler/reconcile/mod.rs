//! # Reconciliation Engine
//!
//! One invocation per trigger. The engine re-reads the resource and walks a
//! fixed decision order, first match wins:
//!
//! 1. Resource gone: done
//! 2. Deletion marker set: delete path
//! 3. Finalizer missing: attach it and stop; the metadata write re-triggers us
//! 4. `status.observedGeneration == metadata.generation`: done, no remote call
//! 5. Otherwise: upsert and record the outcome
//!
//! Every store and remote error is handled here. Only a [`Directive`] leaves
//! the engine.

mod delete;
mod sync;

use crate::constants::{DEFAULT_RATE_LIMIT_REQUEUE_SECS, DEFAULT_REMOTE_CALL_TIMEOUT_SECS};
use crate::controller::reconciler::classify::classify;
use crate::controller::reconciler::finalizer::{has_finalizer, with_finalizer, without_finalizer};
use crate::controller::reconciler::store::{PipelineStore, StoreError};
use crate::controller::reconciler::types::Directive;
use crate::crd::{Pipeline, PipelineStatus};
use crate::observability::metrics::MetricsSink;
use crate::provider::{PipelineSyncPort, SyncError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Fixed delay returned when Fleet Management answers 429
    pub rate_limit_delay: Duration,
    /// Bound on a single remote call, including the rate limiter wait
    pub remote_call_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(DEFAULT_RATE_LIMIT_REQUEUE_SECS),
            remote_call_timeout: Duration::from_secs(DEFAULT_REMOTE_CALL_TIMEOUT_SECS),
        }
    }
}

/// The reconciliation state machine
///
/// Holds no per-resource state; the trigger layer serializes invocations per
/// resource identity.
pub struct Engine {
    store: Arc<dyn PipelineStore>,
    remote: Arc<dyn PipelineSyncPort>,
    metrics: Arc<dyn MetricsSink>,
    settings: EngineSettings,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new(
        store: Arc<dyn PipelineStore>,
        remote: Arc<dyn PipelineSyncPort>,
        metrics: Arc<dyn MetricsSink>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            remote,
            metrics,
            settings,
        }
    }

    /// Reconcile the pipeline `namespace/name` once
    ///
    /// Remote calls are aborted when `cancel` fires; an aborted call commits
    /// no status.
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Directive {
        let start = Instant::now();
        self.metrics.reconcile_started();

        let directive = self.run(namespace, name, cancel).await;

        self.metrics
            .reconcile_finished(directive.outcome(), start.elapsed());
        directive
    }

    async fn run(&self, namespace: &str, name: &str, cancel: &CancellationToken) -> Directive {
        let pipeline = match self.store.get(namespace, name).await {
            Ok(Some(pipeline)) => pipeline,
            Ok(None) | Err(StoreError::NotFound) => {
                debug!("Pipeline {}/{} no longer exists", namespace, name);
                return Directive::Done;
            }
            Err(e) => return Directive::Backoff(format!("failed to fetch pipeline: {e}")),
        };

        if pipeline.metadata.deletion_timestamp.is_some() {
            return self.delete(&pipeline, cancel).await;
        }

        if !has_finalizer(&pipeline) {
            return self.add_finalizer(&pipeline).await;
        }

        let generation = pipeline.metadata.generation.unwrap_or(0);
        let observed_generation = pipeline
            .status
            .as_ref()
            .and_then(|s| s.observed_generation);
        if observed_generation == Some(generation) {
            debug!(
                generation = generation,
                "Skipping reconciliation - generation already observed"
            );
            return Directive::Done;
        }

        self.sync(&pipeline, generation, cancel).await
    }

    async fn add_finalizer(&self, pipeline: &Pipeline) -> Directive {
        match self
            .store
            .replace_finalizers(pipeline, with_finalizer(pipeline))
            .await
        {
            Ok(()) => {
                self.metrics.finalizer_operation("add");
                info!("Added finalizer");
                Directive::Done
            }
            Err(e) => Self::store_failure("add finalizer", e),
        }
    }

    async fn remove_finalizer(&self, pipeline: &Pipeline) -> Directive {
        match self
            .store
            .replace_finalizers(pipeline, without_finalizer(pipeline))
            .await
        {
            Ok(()) | Err(StoreError::NotFound) => {
                self.metrics.finalizer_operation("remove");
                info!("Removed finalizer");
                Directive::Done
            }
            Err(e) => Self::store_failure("remove finalizer", e),
        }
    }

    /// Write `status` against the fetched resourceVersion
    ///
    /// Returns `then` once the write is committed.
    async fn commit_status(
        &self,
        pipeline: &Pipeline,
        status: PipelineStatus,
        then: Directive,
    ) -> Directive {
        match self.store.replace_status(pipeline, status).await {
            Ok(()) => then,
            Err(StoreError::Conflict) => {
                self.metrics.status_conflict();
                debug!("Status write conflicted, requeueing with fresh state");
                Directive::RequeueNow
            }
            Err(e) => Self::store_failure("update status", e),
        }
    }

    fn store_failure(action: &str, error: StoreError) -> Directive {
        match error {
            StoreError::Conflict => {
                debug!("Conflict during {}, requeueing with fresh state", action);
                Directive::RequeueNow
            }
            StoreError::NotFound => {
                debug!("Pipeline disappeared during {}", action);
                Directive::Done
            }
            StoreError::Other(message) => {
                warn!("Failed to {}: {}", action, message);
                Directive::Backoff(format!("failed to {action}: {message}"))
            }
        }
    }

    /// Run one remote call under the invocation's cancellation scope and timeout
    async fn call_remote<T, F>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        let start = Instant::now();
        let timeout = self.settings.remote_call_timeout;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SyncError::Cancelled),
            outcome = tokio::time::timeout(timeout, call) => outcome.unwrap_or_else(|_| {
                Err(SyncError::Transport(format!(
                    "{operation} timed out after {}s",
                    timeout.as_secs()
                )))
            }),
        };

        let label = match &result {
            Ok(_) => "success",
            Err(e) => classify(e).as_str(),
        };
        self.metrics.remote_call(operation, label, start.elapsed());
        result
    }
}
