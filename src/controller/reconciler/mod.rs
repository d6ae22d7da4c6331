//! # Reconciler
//!
//! Core reconciliation logic for `Pipeline` resources.
//!
//! The reconciler:
//! - Attaches a finalizer before any remote work
//! - Skips resources whose generation was already observed
//! - Upserts the full pipeline to Fleet Management and records the outcome
//!   in `Ready`/`Synced` conditions
//! - Deletes the remote pipeline before releasing the finalizer
//!
//! [`Engine`] holds the state machine and only talks to its ports
//! ([`PipelineStore`], [`PipelineSyncPort`](crate::provider::PipelineSyncPort),
//! [`MetricsSink`](crate::observability::metrics::MetricsSink)).
//! [`reconcile`] adapts it to `kube_runtime::Controller`.

pub mod classify;
pub mod finalizer;
pub mod reconcile;
pub mod request;
pub mod status;
pub mod store;
pub mod types;

// Re-export public API
pub use classify::{classify, Classification};
pub use reconcile::{Engine, EngineSettings};
pub use request::{build_upsert_request, RequestError};
pub use store::{KubePipelineStore, PipelineStore, StoreError};
pub use types::{BackoffState, Directive, Reconciler, ReconcilerError};

use crate::crd::Pipeline;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// `kube_runtime::Controller` entry point
///
/// Runs the engine under a child of the shutdown token. `Backoff` becomes an
/// error so `error_policy` applies per-resource backoff; every other directive
/// resets that resource's backoff, and a finished delete drops it.
///
/// # Errors
/// Returns [`ReconcilerError::RetryWithBackoff`] for retriable failures
pub async fn reconcile(
    pipeline: Arc<Pipeline>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = pipeline.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = pipeline.metadata.namespace.as_deref().unwrap_or("default");
    let resource_key = format!("{namespace}/{name}");

    let span = tracing::info_span!(
        "reconcile",
        resource.name = name,
        resource.namespace = namespace,
        resource.generation = pipeline.metadata.generation.unwrap_or(0),
    );

    let cancel = ctx.shutdown.child_token();
    let directive = ctx
        .engine
        .reconcile(namespace, name, &cancel)
        .instrument(span)
        .await;

    let deleting = pipeline.metadata.deletion_timestamp.is_some();
    let action = match directive {
        Directive::Done if deleting => {
            ctx.forget_backoff(&resource_key);
            return Ok(Action::await_change());
        }
        Directive::Done => Action::await_change(),
        Directive::RequeueNow => Action::requeue(Duration::ZERO),
        Directive::RequeueAfter(delay) => Action::requeue(delay),
        Directive::Backoff(reason) => return Err(ReconcilerError::RetryWithBackoff { reason }),
    };
    ctx.reset_backoff(&resource_key);
    Ok(action)
}
