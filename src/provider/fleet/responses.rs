//! Response bodies for the Fleet Management Pipeline API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline as returned by `UpsertPipeline`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePipeline {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contents: String,
    #[serde(default)]
    pub matchers: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RemoteSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSource {
    #[serde(default)]
    pub r#type: String,
    #[serde(default)]
    pub namespace: String,
}
