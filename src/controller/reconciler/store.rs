//! # Resource Store
//!
//! The engine's view of the Kubernetes API: fetch by identity, a metadata
//! write for finalizers, and a separate status subresource write. Both writes
//! carry the `resourceVersion` of the object they were computed from, so a
//! concurrent writer surfaces as [`StoreError::Conflict`] instead of being
//! overwritten.

use crate::crd::{Pipeline, PipelineStatus};
use async_trait::async_trait;
use kube::api::{Api, PostParams};
use kube::Client;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("resource not found")]
    NotFound,
    #[error("resource version conflict")]
    Conflict,
    #[error("store error: {0}")]
    Other(String),
}

impl From<kube::Error> for StoreError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound,
            kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict,
            other => StoreError::Other(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PipelineStore: Send + Sync {
    /// Fetch the current object; `Ok(None)` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pipeline>, StoreError>;

    /// Replace the finalizer list of `pipeline`, checked against its resourceVersion
    async fn replace_finalizers(
        &self,
        pipeline: &Pipeline,
        finalizers: Vec<String>,
    ) -> Result<(), StoreError>;

    /// Replace the status subresource of `pipeline`, checked against its resourceVersion
    async fn replace_status(
        &self,
        pipeline: &Pipeline,
        status: PipelineStatus,
    ) -> Result<(), StoreError>;
}

/// `PipelineStore` over the Kubernetes API
#[derive(Clone)]
pub struct KubePipelineStore {
    client: Client,
}

impl std::fmt::Debug for KubePipelineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePipelineStore").finish_non_exhaustive()
    }
}

impl KubePipelineStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, pipeline: &Pipeline) -> Result<(Api<Pipeline>, String), StoreError> {
        let namespace = pipeline
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| StoreError::Other("metadata.namespace is not set".to_string()))?;
        let name = pipeline
            .metadata
            .name
            .clone()
            .ok_or_else(|| StoreError::Other("metadata.name is not set".to_string()))?;
        Ok((Api::namespaced(self.client.clone(), namespace), name))
    }
}

#[async_trait]
impl PipelineStore for KubePipelineStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pipeline>, StoreError> {
        let api: Api<Pipeline> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn replace_finalizers(
        &self,
        pipeline: &Pipeline,
        finalizers: Vec<String>,
    ) -> Result<(), StoreError> {
        let (api, name) = self.api(pipeline)?;
        let mut updated = pipeline.clone();
        updated.metadata.finalizers = Some(finalizers);
        // Server ignores status on the main resource; leave it as fetched
        api.replace(&name, &PostParams::default(), &updated).await?;
        Ok(())
    }

    async fn replace_status(
        &self,
        pipeline: &Pipeline,
        status: PipelineStatus,
    ) -> Result<(), StoreError> {
        let (api, name) = self.api(pipeline)?;
        let mut updated = pipeline.clone();
        updated.status = Some(status);
        let body = serde_json::to_vec(&updated).map_err(|e| StoreError::Other(e.to_string()))?;
        api.replace_status(&name, &PostParams::default(), body).await?;
        Ok(())
    }
}
