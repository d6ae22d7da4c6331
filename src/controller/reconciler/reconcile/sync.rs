//! Normal path: upsert the desired pipeline and record the outcome.

use super::Engine;
use crate::constants::{OPERATION_UPSERT, REASON_SYNC_FAILED, REASON_VALIDATION_ERROR};
use crate::controller::reconciler::classify::{classify, Classification};
use crate::controller::reconciler::request::build_upsert_request;
use crate::controller::reconciler::status::{record_failure, record_success};
use crate::controller::reconciler::types::Directive;
use crate::crd::Pipeline;
use crate::provider::SyncError;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

impl Engine {
    pub(super) async fn sync(
        &self,
        pipeline: &Pipeline,
        generation: i64,
        cancel: &CancellationToken,
    ) -> Directive {
        let mut status = pipeline.status.clone().unwrap_or_default();

        let request = match build_upsert_request(pipeline) {
            Ok(request) => request,
            Err(e) => {
                info!("Pipeline spec is invalid: {}", e);
                record_failure(
                    &mut status,
                    REASON_VALIDATION_ERROR,
                    &e.to_string(),
                    generation,
                    true,
                    Utc::now(),
                );
                return self.commit_status(pipeline, status, Directive::Done).await;
            }
        };

        let mut recreating = false;
        loop {
            let result = self
                .call_remote(
                    OPERATION_UPSERT,
                    cancel,
                    self.remote.upsert_pipeline(&request),
                )
                .await;

            let error = match result {
                // Without an ID the delete path has nothing to remove
                Ok(remote) if remote.id.is_empty() => SyncError::Transport(
                    "UpsertPipeline succeeded without returning a pipeline ID".to_string(),
                ),
                Ok(remote) => {
                    info!(
                        pipeline.id = remote.id.as_str(),
                        generation = generation,
                        "Synced pipeline to Fleet Management"
                    );
                    record_success(&mut status, &remote, generation, Utc::now());
                    return self.commit_status(pipeline, status, Directive::Done).await;
                }
                Err(error) => error,
            };

            match classify(&error) {
                Classification::NotFound if !recreating => {
                    warn!(
                        previous_id = status.remote_id().unwrap_or(""),
                        "Remote pipeline vanished, recreating"
                    );
                    status.id = None;
                    recreating = true;
                }
                Classification::Validation { message } => {
                    info!("Fleet Management rejected pipeline: {}", message);
                    record_failure(
                        &mut status,
                        REASON_VALIDATION_ERROR,
                        &message,
                        generation,
                        true,
                        Utc::now(),
                    );
                    return self.commit_status(pipeline, status, Directive::Done).await;
                }
                Classification::RateLimited => {
                    info!(
                        "Fleet Management rate limited the upsert, retrying in {}s",
                        self.settings.rate_limit_delay.as_secs()
                    );
                    return Directive::RequeueAfter(self.settings.rate_limit_delay);
                }
                Classification::NotFound | Classification::ServerOrTransport { .. } => {
                    let message = error.to_string();
                    if error == SyncError::Cancelled {
                        info!("Upsert cancelled, leaving status untouched");
                        return Directive::Backoff(message);
                    }
                    error!("Failed to sync pipeline: {}", message);
                    record_failure(
                        &mut status,
                        REASON_SYNC_FAILED,
                        &message,
                        generation,
                        false,
                        Utc::now(),
                    );
                    return self
                        .commit_status(pipeline, status, Directive::Backoff(message))
                        .await;
                }
            }
        }
    }
}
