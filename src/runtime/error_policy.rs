//! # Error Policy
//!
//! Backoff for failed reconciliations and classification of watch stream
//! errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::Pipeline;
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Requeue a failed resource with its own exponential backoff
pub fn handle_reconciliation_error(
    pipeline: Arc<Pipeline>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = pipeline.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = pipeline.metadata.namespace.as_deref().unwrap_or("default");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name,
        resource.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    let resource_key = format!("{namespace}/{name}");
    let (delay, error_count) = ctx.next_backoff(&resource_key);

    let next_retry = chrono::Utc::now()
        + chrono::Duration::milliseconds(i64::try_from(delay.as_millis()).unwrap_or(i64::MAX));
    info!(
        "Retrying {} in {}ms (error count: {}, next retry: {})",
        resource_key,
        delay.as_millis(),
        error_count,
        next_retry.to_rfc3339()
    );

    Action::requeue(delay)
}

/// What the watch loop should do with a stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// 401/403: credentials or RBAC changed
    Unauthorized,
    /// 410: resource version expired; the watcher relists on its own
    Expired,
    /// 429: API server busy
    Throttled,
    /// 404: CRD missing or object gone
    NotFound,
    Other,
}

#[must_use]
pub fn classify_watch_error(error_string: &str) -> WatchErrorKind {
    // 404 before 401: a plain-text 404 body surfaces inside "WatchFailed" chains
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");

    if is_not_found {
        WatchErrorKind::NotFound
    } else if error_string.contains("401")
        || error_string.contains("403")
        || error_string.contains("Unauthorized")
        || error_string.contains("Forbidden")
    {
        WatchErrorKind::Unauthorized
    } else if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone")
    {
        WatchErrorKind::Expired
    } else if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        WatchErrorKind::Throttled
    } else {
        WatchErrorKind::Other
    }
}

/// Handle a watch stream error
///
/// Sleeps where a retry should be delayed.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff_ms: &AtomicU64,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );

    async move {
        match classify_watch_error(error_string) {
            WatchErrorKind::Unauthorized => {
                error!("Watch authentication failed - RBAC may have been revoked or the token expired");
                error!("   Check: kubectl auth can-i watch pipelines.fleetmanagement.grafana.com --all-namespaces");
                warn!(
                    "Waiting {}s before retrying watch...",
                    watch_restart_delay.as_secs()
                );
                tokio::time::sleep(watch_restart_delay).await;
            }
            WatchErrorKind::Expired => {
                warn!("Watch resource version expired (410), watcher will relist");
            }
            WatchErrorKind::Throttled => {
                let current = backoff_ms.load(Ordering::Relaxed);
                warn!(
                    "API server throttled the watch (429), backing off for {}ms",
                    current
                );
                tokio::time::sleep(Duration::from_millis(current)).await;
                backoff_ms.store(
                    current.saturating_mul(2).min(max_backoff_ms),
                    Ordering::Relaxed,
                );
            }
            WatchErrorKind::NotFound => {
                warn!(
                    "Watched resource not found (404) - the Pipeline CRD may be missing. Error: {}",
                    error_string
                );
            }
            WatchErrorKind::Other => {
                error!("Controller stream error: {}", error_string);
                tokio::time::sleep(watch_restart_delay).await;
            }
        }
    }
    .instrument(error_span)
    .await
}
