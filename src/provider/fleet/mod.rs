//! # Fleet Management REST Client
//!
//! Native REST client for the Fleet Management Pipeline API
//! (`pipeline.v1.PipelineService`), using reqwest with rustls.
//!
//! Every operation is a JSON `POST` to `{base_url}{Operation}` with HTTP basic
//! auth. Requests are paced client-side by [`RateLimiter`].

mod rate_limit;
mod requests;
mod responses;

pub use rate_limit::RateLimiter;
pub use requests::*;
pub use responses::*;

use crate::config::FleetClientConfig;
use crate::constants::{OPERATION_DELETE, OPERATION_UPSERT};
use crate::provider::{PipelineSyncPort, SyncError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

/// Fleet Management Pipeline API client
pub struct FleetClient {
    http_client: Client,
    base_url: String,
    username: String,
    password: String,
    limiter: RateLimiter,
}

impl std::fmt::Debug for FleetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl FleetClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &FleetClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()
            .context("Failed to build Fleet Management HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            limiter: RateLimiter::new(config.min_request_interval()),
        })
    }

    /// POST a JSON body to an operation and return the raw response
    ///
    /// Non-200 responses become [`SyncError::Api`], carrying the response body as message.
    async fn post<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
        not_found_ok: bool,
    ) -> Result<Option<reqwest::Response>, SyncError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, operation);
        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("{operation} request failed: {e}")))?;

        let status = response.status();
        debug!(http.status = status.as_u16(), "fleet.response");

        if status == StatusCode::OK {
            return Ok(Some(response));
        }
        if not_found_ok && status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let message = response.text().await.unwrap_or_default();
        Err(SyncError::Api {
            status: status.as_u16(),
            operation: operation.to_string(),
            message,
        })
    }
}

#[async_trait]
impl PipelineSyncPort for FleetClient {
    async fn upsert_pipeline(
        &self,
        request: &UpsertPipelineRequest,
    ) -> Result<RemotePipeline, SyncError> {
        let span = info_span!(
            "fleet.pipeline.upsert",
            pipeline.name = request.pipeline.name.as_str()
        );
        async move {
            let response = self
                .post(OPERATION_UPSERT, request, false)
                .await?
                .ok_or_else(|| SyncError::Transport("UpsertPipeline returned no body".to_string()))?;

            response.json::<RemotePipeline>().await.map_err(|e| {
                SyncError::Transport(format!("failed to decode UpsertPipeline response: {e}"))
            })
        }
        .instrument(span)
        .await
    }

    async fn delete_pipeline(&self, id: &str) -> Result<(), SyncError> {
        let span = info_span!("fleet.pipeline.delete", pipeline.id = id);
        async move {
            match self
                .post(OPERATION_DELETE, &DeletePipelineRequest { id }, true)
                .await?
            {
                Some(_) => debug!("pipeline deleted"),
                None => debug!("pipeline already absent"),
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}
