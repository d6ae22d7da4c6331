//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! The reconciler reports through the [`MetricsSink`] trait and never touches a
//! registry directly. [`PrometheusMetrics`] owns its own `Registry`, which the
//! HTTP server exposes on `/metrics`.
//!
//! ## Metrics Exposed
//!
//! - `fleet_pipeline_reconciliations_total{outcome}` - Reconciliations by directive
//! - `fleet_pipeline_reconcile_duration_seconds` - Duration of reconciliations
//! - `fleet_pipeline_remote_calls_total{operation,result}` - Fleet Management calls
//! - `fleet_pipeline_remote_call_duration_seconds{operation}` - Duration of Fleet Management calls
//! - `fleet_pipeline_status_conflicts_total` - Status writes rejected by resourceVersion checks
//! - `fleet_pipeline_finalizer_operations_total{operation}` - Finalizers added and removed
//! - `fleet_pipeline_reconciliations_in_flight` - Reconciliations currently running

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Destination for reconciler measurements
pub trait MetricsSink: Send + Sync {
    fn reconcile_started(&self);
    /// `outcome` is the directive label, e.g. `done` or `backoff`
    fn reconcile_finished(&self, outcome: &str, elapsed: Duration);
    /// `result` is `success` or a classification label
    fn remote_call(&self, operation: &str, result: &str, elapsed: Duration);
    fn status_conflict(&self);
    /// `operation` is `add` or `remove`
    fn finalizer_operation(&self, operation: &str);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn reconcile_started(&self) {}
    fn reconcile_finished(&self, _outcome: &str, _elapsed: Duration) {}
    fn remote_call(&self, _operation: &str, _result: &str, _elapsed: Duration) {}
    fn status_conflict(&self) {}
    fn finalizer_operation(&self, _operation: &str) {}
}

/// Prometheus-backed sink with a private registry
#[derive(Debug, Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    reconciliations_total: IntCounterVec,
    reconcile_duration: HistogramVec,
    reconciliations_in_flight: IntGauge,
    remote_calls_total: IntCounterVec,
    remote_call_duration: HistogramVec,
    status_conflicts_total: IntCounter,
    finalizer_operations_total: IntCounterVec,
}

impl PrometheusMetrics {
    /// Create and register all metrics
    ///
    /// # Errors
    /// Returns an error if a metric definition is invalid or registered twice
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconciliations_total = IntCounterVec::new(
            Opts::new(
                "fleet_pipeline_reconciliations_total",
                "Total number of pipeline reconciliations by outcome",
            ),
            &["outcome"],
        )?;
        let reconcile_duration = HistogramVec::new(
            HistogramOpts::new(
                "fleet_pipeline_reconcile_duration_seconds",
                "Duration of pipeline reconciliations in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            &["outcome"],
        )?;
        let reconciliations_in_flight = IntGauge::new(
            "fleet_pipeline_reconciliations_in_flight",
            "Number of pipeline reconciliations currently running",
        )?;
        let remote_calls_total = IntCounterVec::new(
            Opts::new(
                "fleet_pipeline_remote_calls_total",
                "Total number of Fleet Management API calls",
            ),
            &["operation", "result"],
        )?;
        let remote_call_duration = HistogramVec::new(
            HistogramOpts::new(
                "fleet_pipeline_remote_call_duration_seconds",
                "Duration of Fleet Management API calls in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            &["operation"],
        )?;
        let status_conflicts_total = IntCounter::new(
            "fleet_pipeline_status_conflicts_total",
            "Total number of writes rejected by resourceVersion conflicts",
        )?;
        let finalizer_operations_total = IntCounterVec::new(
            Opts::new(
                "fleet_pipeline_finalizer_operations_total",
                "Total number of finalizer additions and removals",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(reconciliations_total.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;
        registry.register(Box::new(reconciliations_in_flight.clone()))?;
        registry.register(Box::new(remote_calls_total.clone()))?;
        registry.register(Box::new(remote_call_duration.clone()))?;
        registry.register(Box::new(status_conflicts_total.clone()))?;
        registry.register(Box::new(finalizer_operations_total.clone()))?;

        Ok(Self {
            registry,
            reconciliations_total,
            reconcile_duration,
            reconciliations_in_flight,
            remote_calls_total,
            remote_call_duration,
            status_conflicts_total,
            finalizer_operations_total,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text exposition format
    ///
    /// # Errors
    /// Returns an error if encoding fails
    pub fn encode_text(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

impl MetricsSink for PrometheusMetrics {
    fn reconcile_started(&self) {
        self.reconciliations_in_flight.inc();
    }

    fn reconcile_finished(&self, outcome: &str, elapsed: Duration) {
        self.reconciliations_in_flight.dec();
        self.reconciliations_total.with_label_values(&[outcome]).inc();
        self.reconcile_duration
            .with_label_values(&[outcome])
            .observe(elapsed.as_secs_f64());
    }

    fn remote_call(&self, operation: &str, result: &str, elapsed: Duration) {
        self.remote_calls_total
            .with_label_values(&[operation, result])
            .inc();
        self.remote_call_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    fn status_conflict(&self) {
        self.status_conflicts_total.inc();
    }

    fn finalizer_operation(&self, operation: &str) {
        self.finalizer_operations_total
            .with_label_values(&[operation])
            .inc();
    }
}
