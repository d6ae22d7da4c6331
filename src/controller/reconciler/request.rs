//! # Upsert Request Construction
//!
//! Builds the full `UpsertPipeline` body from a `Pipeline` resource.
//!
//! Upserts replace the remote object wholesale, so every spec field is copied
//! on every call. Local validation mirrors the CRD schema for objects that
//! bypassed it (e.g. written before a schema change).

use crate::constants::{MAX_MATCHERS, MAX_MATCHER_LENGTH};
use crate::crd::{Pipeline, SourceType};
use crate::provider::fleet::{PipelineRequest, SourceRequest, UpsertPipelineRequest};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// `key=value`, `key!=value`, `key=~regex`, `key!~regex`, optionally quoted value
static MATCHER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*(=~|!~|!=|=)\s*(.*?)\s*$")
        .unwrap_or_else(|e| panic!("matcher pattern must compile: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("metadata.{0} is not set")]
    MissingMetadata(&'static str),
    #[error("spec.contents must not be empty")]
    EmptyContents,
    #[error("spec.matchers has {count} entries, at most {MAX_MATCHERS} are allowed")]
    TooManyMatchers { count: usize },
    #[error("matcher {index} is {length} characters long, at most {MAX_MATCHER_LENGTH} are allowed")]
    MatcherTooLong { index: usize, length: usize },
    #[error("matcher {index} ({matcher:?}) is not a valid key=value, key!=value, key=~regex or key!~regex expression")]
    InvalidMatcher { index: usize, matcher: String },
    #[error("matcher {index} ({matcher:?}) has an invalid regular expression: {reason}")]
    InvalidMatcherRegex {
        index: usize,
        matcher: String,
        reason: String,
    },
}

/// Build the upsert request for a pipeline
///
/// # Errors
/// Returns an error if the resource has no name/namespace or its spec is invalid
pub fn build_upsert_request(pipeline: &Pipeline) -> Result<UpsertPipelineRequest, RequestError> {
    let resource_name = pipeline
        .metadata
        .name
        .as_deref()
        .ok_or(RequestError::MissingMetadata("name"))?;
    let resource_namespace = pipeline
        .metadata
        .namespace
        .as_deref()
        .ok_or(RequestError::MissingMetadata("namespace"))?;

    let spec = &pipeline.spec;
    if spec.contents.trim().is_empty() {
        return Err(RequestError::EmptyContents);
    }
    validate_matchers(&spec.matchers)?;

    let name = spec
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(resource_name)
        .to_string();

    let source = match &spec.source {
        Some(source) => SourceRequest {
            r#type: source.r#type.to_fleet_api().to_string(),
            namespace: source.namespace.clone().unwrap_or_default(),
        },
        None => SourceRequest {
            r#type: SourceType::Kubernetes.to_fleet_api().to_string(),
            namespace: format!("{resource_namespace}/{resource_name}"),
        },
    };

    Ok(UpsertPipelineRequest {
        pipeline: PipelineRequest {
            name,
            contents: spec.contents.clone(),
            matchers: spec.matchers.clone(),
            enabled: spec.enabled,
            config_type: spec.config_type.to_fleet_api().to_string(),
            source,
        },
        validate_only: false,
    })
}

fn validate_matchers(matchers: &[String]) -> Result<(), RequestError> {
    if matchers.len() > MAX_MATCHERS {
        return Err(RequestError::TooManyMatchers {
            count: matchers.len(),
        });
    }

    for (index, matcher) in matchers.iter().enumerate() {
        let length = matcher.chars().count();
        if length > MAX_MATCHER_LENGTH {
            return Err(RequestError::MatcherTooLong { index, length });
        }

        let captures =
            MATCHER_PATTERN
                .captures(matcher)
                .ok_or_else(|| RequestError::InvalidMatcher {
                    index,
                    matcher: matcher.clone(),
                })?;

        let operator = captures.get(2).map_or("", |m| m.as_str());
        if operator == "=~" || operator == "!~" {
            let value = captures.get(3).map_or("", |m| m.as_str());
            let expr = value.trim_matches('"');
            if let Err(e) = Regex::new(&format!("^(?:{expr})$")) {
                return Err(RequestError::InvalidMatcherRegex {
                    index,
                    matcher: matcher.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(())
}
