//! Common test utilities
//!
//! Provides rustls setup for contract tests and in-memory doubles of the
//! resource store, the Fleet Management port and the metrics sink for engine
//! tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use fleet_pipeline_controller::constants::PIPELINE_FINALIZER;
use fleet_pipeline_controller::controller::reconciler::{PipelineStore, StoreError};
use fleet_pipeline_controller::crd::{ConfigType, Pipeline, PipelineSpec, PipelineStatus};
use fleet_pipeline_controller::observability::metrics::MetricsSink;
use fleet_pipeline_controller::provider::fleet::{RemotePipeline, UpsertPipelineRequest};
use fleet_pipeline_controller::provider::{PipelineSyncPort, SyncError};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

pub const NAMESPACE: &str = "observability";
pub const NAME: &str = "node-metrics";

/// A `Pipeline` as the API server would hand it out after creation
pub fn pipeline(generation: i64) -> Pipeline {
    let mut pipeline = Pipeline::new(
        NAME,
        PipelineSpec {
            name: None,
            contents: "prometheus.exporter.unix \"default\" { }".to_string(),
            matchers: vec!["env=prod".to_string()],
            enabled: true,
            config_type: ConfigType::Alloy,
            source: None,
        },
    );
    pipeline.metadata.namespace = Some(NAMESPACE.to_string());
    pipeline.metadata.generation = Some(generation);
    pipeline
}

pub fn remote_pipeline(id: &str) -> RemotePipeline {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": NAME,
        "createdAt": "2026-01-01T00:00:00Z",
        "updatedAt": "2026-01-01T00:00:00Z",
        "revisionId": "1"
    }))
    .expect("valid remote pipeline")
}

pub fn api_error(status: u16, operation: &str, message: &str) -> SyncError {
    SyncError::Api {
        status,
        operation: operation.to_string(),
        message: message.to_string(),
    }
}

#[derive(Default)]
struct StoreState {
    objects: HashMap<(String, String), Pipeline>,
    fail_next_status_write: Option<StoreError>,
    fail_next_finalizer_write: Option<StoreError>,
    status_writes: usize,
    finalizer_writes: usize,
}

/// In-memory resource store with resourceVersion checks
///
/// Every write bumps the resourceVersion. Objects that are marked for
/// deletion disappear once their finalizer list becomes empty.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

fn key(pipeline: &Pipeline) -> (String, String) {
    (
        pipeline.metadata.namespace.clone().unwrap_or_default(),
        pipeline.metadata.name.clone().unwrap_or_default(),
    )
}

fn bump_version(pipeline: &mut Pipeline) {
    let next = pipeline
        .metadata
        .resource_version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    pipeline.metadata.resource_version = Some(next.to_string());
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(pipeline: Pipeline) -> Self {
        let store = Self::new();
        store.insert(pipeline);
        store
    }

    pub fn insert(&self, mut pipeline: Pipeline) {
        bump_version(&mut pipeline);
        let mut state = self.state.lock().unwrap();
        state.objects.insert(key(&pipeline), pipeline);
    }

    pub fn current(&self) -> Option<Pipeline> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(NAMESPACE.to_string(), NAME.to_string()))
            .cloned()
    }

    pub fn status(&self) -> PipelineStatus {
        self.current()
            .and_then(|p| p.status)
            .unwrap_or_default()
    }

    pub fn finalizers(&self) -> Vec<String> {
        self.current()
            .and_then(|p| p.metadata.finalizers)
            .unwrap_or_default()
    }

    /// Simulate a user edit: apply `edit` to the spec and bump the generation
    pub fn edit_spec(&self, edit: impl FnOnce(&mut PipelineSpec)) {
        let mut state = self.state.lock().unwrap();
        let pipeline = state
            .objects
            .get_mut(&(NAMESPACE.to_string(), NAME.to_string()))
            .expect("pipeline exists");
        edit(&mut pipeline.spec);
        pipeline.metadata.generation = Some(pipeline.metadata.generation.unwrap_or(0) + 1);
        bump_version(pipeline);
    }

    /// Simulate `kubectl delete`: set the deletion marker
    pub fn mark_for_deletion(&self) {
        let mut state = self.state.lock().unwrap();
        let k = (NAMESPACE.to_string(), NAME.to_string());
        let pipeline = state.objects.get_mut(&k).expect("pipeline exists");
        if pipeline
            .metadata
            .finalizers
            .as_ref()
            .is_none_or(Vec::is_empty)
        {
            state.objects.remove(&k);
            return;
        }
        pipeline.metadata.deletion_timestamp = Some(
            serde_json::from_value::<Time>(serde_json::json!("2026-01-01T00:00:00Z"))
                .expect("valid timestamp"),
        );
        bump_version(pipeline);
    }

    /// Simulate a concurrent writer by bumping the stored resourceVersion
    pub fn touch(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(pipeline) = state
            .objects
            .get_mut(&(NAMESPACE.to_string(), NAME.to_string()))
        {
            bump_version(pipeline);
        }
    }

    pub fn fail_next_status_write(&self, error: StoreError) {
        self.state.lock().unwrap().fail_next_status_write = Some(error);
    }

    pub fn fail_next_finalizer_write(&self, error: StoreError) {
        self.state.lock().unwrap().fail_next_finalizer_write = Some(error);
    }

    pub fn status_writes(&self) -> usize {
        self.state.lock().unwrap().status_writes
    }

    pub fn finalizer_writes(&self) -> usize {
        self.state.lock().unwrap().finalizer_writes
    }
}

fn check_version(
    objects: &HashMap<(String, String), Pipeline>,
    incoming: &Pipeline,
) -> Result<(), StoreError> {
    let stored = objects.get(&key(incoming)).ok_or(StoreError::NotFound)?;
    if stored.metadata.resource_version != incoming.metadata.resource_version {
        return Err(StoreError::Conflict);
    }
    Ok(())
}

#[async_trait]
impl PipelineStore for InMemoryStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Pipeline>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn replace_finalizers(
        &self,
        pipeline: &Pipeline,
        finalizers: Vec<String>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next_finalizer_write.take() {
            return Err(error);
        }
        check_version(&state.objects, pipeline)?;
        state.finalizer_writes += 1;

        let k = key(pipeline);
        let stored = state.objects.get_mut(&k).ok_or(StoreError::NotFound)?;
        let release = stored.metadata.deletion_timestamp.is_some() && finalizers.is_empty();
        stored.metadata.finalizers = Some(finalizers);
        bump_version(stored);
        if release {
            state.objects.remove(&k);
        }
        Ok(())
    }

    async fn replace_status(
        &self,
        pipeline: &Pipeline,
        status: PipelineStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next_status_write.take() {
            return Err(error);
        }
        check_version(&state.objects, pipeline)?;
        state.status_writes += 1;

        let stored = state
            .objects
            .get_mut(&key(pipeline))
            .ok_or(StoreError::NotFound)?;
        stored.status = Some(status);
        bump_version(stored);
        Ok(())
    }
}

/// Fleet Management double with scripted responses and call recording
///
/// An exhausted script answers upserts with a fresh pipeline `"X"` and
/// deletes with success.
#[derive(Default)]
pub struct ScriptedRemote {
    upsert_results: Mutex<VecDeque<Result<RemotePipeline, SyncError>>>,
    delete_results: Mutex<VecDeque<Result<(), SyncError>>>,
    upsert_calls: Mutex<Vec<UpsertPipelineRequest>>,
    delete_calls: Mutex<Vec<String>>,
    hang: AtomicBool,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_upsert(&self, result: Result<RemotePipeline, SyncError>) {
        self.upsert_results.lock().unwrap().push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), SyncError>) {
        self.delete_results.lock().unwrap().push_back(result);
    }

    /// Make every call block until cancelled
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn upsert_calls(&self) -> Vec<UpsertPipelineRequest> {
        self.upsert_calls.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.delete_calls.lock().unwrap().clone()
    }

    pub fn remote_calls(&self) -> usize {
        self.upsert_calls.lock().unwrap().len() + self.delete_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PipelineSyncPort for ScriptedRemote {
    async fn upsert_pipeline(
        &self,
        request: &UpsertPipelineRequest,
    ) -> Result<RemotePipeline, SyncError> {
        self.upsert_calls.lock().unwrap().push(request.clone());
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = self.upsert_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(remote_pipeline("X")))
    }

    async fn delete_pipeline(&self, id: &str) -> Result<(), SyncError> {
        self.delete_calls.lock().unwrap().push(id.to_string());
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let next = self.delete_results.lock().unwrap().pop_front();
        next.unwrap_or(Ok(()))
    }
}

/// Metrics sink that records every call
#[derive(Default)]
pub struct RecordingMetrics {
    pub outcomes: Mutex<Vec<String>>,
    pub remote_calls: Mutex<Vec<(String, String)>>,
    pub conflicts: Mutex<usize>,
    pub finalizer_operations: Mutex<Vec<String>>,
}

impl MetricsSink for RecordingMetrics {
    fn reconcile_started(&self) {}

    fn reconcile_finished(&self, outcome: &str, _elapsed: Duration) {
        self.outcomes.lock().unwrap().push(outcome.to_string());
    }

    fn remote_call(&self, operation: &str, result: &str, _elapsed: Duration) {
        self.remote_calls
            .lock()
            .unwrap()
            .push((operation.to_string(), result.to_string()));
    }

    fn status_conflict(&self) {
        *self.conflicts.lock().unwrap() += 1;
    }

    fn finalizer_operation(&self, operation: &str) {
        self.finalizer_operations
            .lock()
            .unwrap()
            .push(operation.to_string());
    }
}

/// A pipeline that already carries the finalizer, as after the first pass
pub fn finalized_pipeline(generation: i64) -> Pipeline {
    let mut pipeline = pipeline(generation);
    pipeline.metadata.finalizers = Some(vec![PIPELINE_FINALIZER.to_string()]);
    pipeline
}
