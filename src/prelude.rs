//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use fleet_pipeline_controller::prelude::*;
//! ```

pub use crate::crd::*;

pub use crate::provider::{PipelineSyncPort, SyncError};

pub use crate::controller::reconciler::{
    reconcile, Directive, Engine, EngineSettings, PipelineStore, Reconciler, ReconcilerError,
    StoreError,
};

pub use crate::config::{
    ControllerConfig, FleetClientConfig, ServerConfig, SharedControllerConfig, SharedServerConfig,
};

pub use crate::observability::metrics::{MetricsSink, NoopMetrics, PrometheusMetrics};

pub use crate::provider::fleet::FleetClient;
