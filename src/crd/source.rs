//! # Config Type and Provenance
//!
//! Enums carried on the spec, and their Fleet Management API representations.

use serde::{Deserialize, Serialize};

/// Collector configuration syntax
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConfigType {
    /// Grafana Alloy configuration syntax
    #[default]
    Alloy,
    /// OpenTelemetry Collector configuration syntax
    OpenTelemetryCollector,
}

impl ConfigType {
    #[must_use]
    pub fn to_fleet_api(self) -> &'static str {
        match self {
            ConfigType::Alloy => "CONFIG_TYPE_ALLOY",
            ConfigType::OpenTelemetryCollector => "CONFIG_TYPE_OTEL",
        }
    }

    /// Unknown API values fall back to Alloy
    #[must_use]
    pub fn from_fleet_api(value: &str) -> Self {
        match value {
            "CONFIG_TYPE_OTEL" => ConfigType::OpenTelemetryCollector,
            _ => ConfigType::Alloy,
        }
    }
}

/// Origin of a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum SourceType {
    Git,
    Terraform,
    /// Managed by this controller
    #[default]
    Kubernetes,
    Unspecified,
}

impl SourceType {
    #[must_use]
    pub fn to_fleet_api(self) -> &'static str {
        match self {
            SourceType::Git => "SOURCE_TYPE_GIT",
            SourceType::Terraform => "SOURCE_TYPE_TERRAFORM",
            SourceType::Kubernetes => "SOURCE_TYPE_KUBERNETES",
            SourceType::Unspecified => "SOURCE_TYPE_UNSPECIFIED",
        }
    }

    /// Unknown API values map to `Unspecified`
    #[must_use]
    pub fn from_fleet_api(value: &str) -> Self {
        match value {
            "SOURCE_TYPE_GIT" => SourceType::Git,
            "SOURCE_TYPE_TERRAFORM" => SourceType::Terraform,
            "SOURCE_TYPE_KUBERNETES" => SourceType::Kubernetes,
            _ => SourceType::Unspecified,
        }
    }
}

/// Provenance metadata for a pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSource {
    #[serde(default)]
    pub r#type: SourceType,
    /// Additional context about the source
    /// Git: repository name or URL. Terraform: workspace or module. Kubernetes: cluster or context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
