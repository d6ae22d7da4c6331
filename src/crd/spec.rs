//! # Pipeline Spec
//!
//! The `Pipeline` custom resource and its spec.

use super::source::{ConfigType, PipelineSource};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Pipeline Custom Resource Definition
///
/// Declares a Fleet Management pipeline: collector configuration plus the
/// matchers that assign it to collectors.
///
/// # Example
///
/// ```yaml
/// apiVersion: fleetmanagement.grafana.com/v1alpha1
/// kind: Pipeline
/// metadata:
///   name: node-metrics
///   namespace: observability
/// spec:
///   contents: |
///     prometheus.exporter.unix "default" { }
///   matchers:
///     - env=prod
///     - team!~"sandbox-.*"
///   configType: Alloy
/// ```
#[derive(CustomResource, Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Pipeline",
    group = "fleetmanagement.grafana.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::PipelineStatus",
    shortname = "fmp",
    printcolumn = r#"{"name":"Enabled", "type":"boolean", "jsonPath":".spec.enabled"}, {"name":"Config Type", "type":"string", "jsonPath":".spec.configType"}, {"name":"Fleet ID", "type":"string", "jsonPath":".status.id"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    /// Pipeline name in Fleet Management
    /// Defaults to metadata.name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Alloy or OpenTelemetry Collector configuration
    #[schemars(length(min = 1))]
    pub contents: String,
    /// Matchers assigning the pipeline to collectors
    /// Prometheus Alertmanager syntax: key=value, key!=value, key=~regex, key!~regex
    #[serde(default)]
    #[schemars(length(max = 100))]
    pub matchers: Vec<String>,
    /// Whether collectors should run the pipeline
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub config_type: ConfigType,
    /// Origin of the pipeline
    /// Unset means this controller is the origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PipelineSource>,
}

#[must_use]
pub fn default_true() -> bool {
    true
}
