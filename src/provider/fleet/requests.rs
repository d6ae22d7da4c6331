//! Request bodies for the Fleet Management Pipeline API.

use serde::{Deserialize, Serialize};

/// Body of `UpsertPipeline`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPipelineRequest {
    pub pipeline: PipelineRequest,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub validate_only: bool,
}

/// Pipeline as sent on upsert
///
/// Upserts replace the whole remote object, so every field is always
/// serialized. There is deliberately no `id` field: Fleet Management keys
/// upserts by name and source and assigns the ID itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRequest {
    pub name: String,
    pub contents: String,
    pub matchers: Vec<String>,
    pub enabled: bool,
    pub config_type: String,
    pub source: SourceRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    pub r#type: String,
    pub namespace: String,
}

/// Body of `DeletePipeline`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePipelineRequest<'a> {
    pub id: &'a str,
}
