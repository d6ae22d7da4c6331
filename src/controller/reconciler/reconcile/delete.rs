//! Delete path: remove the remote pipeline, then release the finalizer.
//!
//! The finalizer is only released once the remote object is confirmed gone
//! (deleted, already absent, or never created). A failed finalizer write after
//! a successful remote delete is retried; the delete is idempotent.

use super::Engine;
use crate::constants::OPERATION_DELETE;
use crate::controller::reconciler::classify::{classify, Classification};
use crate::controller::reconciler::finalizer::has_finalizer;
use crate::controller::reconciler::status::record_delete_failure;
use crate::controller::reconciler::types::Directive;
use crate::crd::{Pipeline, PipelineStatus};
use crate::provider::SyncError;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

impl Engine {
    pub(super) async fn delete(&self, pipeline: &Pipeline, cancel: &CancellationToken) -> Directive {
        if !has_finalizer(pipeline) {
            debug!("Finalizer already released");
            return Directive::Done;
        }

        let Some(remote_id) = pipeline.status.as_ref().and_then(|s| s.remote_id()) else {
            debug!("Pipeline was never synced, skipping remote delete");
            return self.remove_finalizer(pipeline).await;
        };

        let result = self
            .call_remote(
                OPERATION_DELETE,
                cancel,
                self.remote.delete_pipeline(remote_id),
            )
            .await;

        if let Err(error) = result {
            match classify(&error) {
                Classification::NotFound => {
                    info!(pipeline.id = remote_id, "Remote pipeline already absent");
                }
                Classification::RateLimited => {
                    info!(
                        "Fleet Management rate limited the delete, retrying in {}s",
                        self.settings.rate_limit_delay.as_secs()
                    );
                    let status = delete_failure_status(pipeline, &error.to_string());
                    return self
                        .commit_status(
                            pipeline,
                            status,
                            Directive::RequeueAfter(self.settings.rate_limit_delay),
                        )
                        .await;
                }
                Classification::Validation { .. } | Classification::ServerOrTransport { .. } => {
                    let message = error.to_string();
                    if error == SyncError::Cancelled {
                        info!("Delete cancelled, keeping finalizer");
                        return Directive::Backoff(message);
                    }
                    error!(
                        pipeline.id = remote_id,
                        "Failed to delete remote pipeline: {}", message
                    );
                    let status = delete_failure_status(pipeline, &message);
                    return self
                        .commit_status(pipeline, status, Directive::Backoff(message))
                        .await;
                }
            }
        } else {
            info!(pipeline.id = remote_id, "Deleted remote pipeline");
        }

        self.remove_finalizer(pipeline).await
    }
}

/// Current status with `Synced=False, reason=DeleteFailed`; the finalizer stays
fn delete_failure_status(pipeline: &Pipeline, message: &str) -> PipelineStatus {
    let mut status = pipeline.status.clone().unwrap_or_default();
    record_delete_failure(
        &mut status,
        message,
        pipeline.metadata.generation.unwrap_or(0),
        Utc::now(),
    );
    status
}
