//! Finalizer set helpers.

use crate::constants::PIPELINE_FINALIZER;
use crate::crd::Pipeline;

#[must_use]
pub fn has_finalizer(pipeline: &Pipeline) -> bool {
    pipeline
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|name| name == PIPELINE_FINALIZER))
}

/// Current finalizers plus ours
#[must_use]
pub fn with_finalizer(pipeline: &Pipeline) -> Vec<String> {
    let mut finalizers = pipeline.metadata.finalizers.clone().unwrap_or_default();
    if !finalizers.iter().any(|name| name == PIPELINE_FINALIZER) {
        finalizers.push(PIPELINE_FINALIZER.to_string());
    }
    finalizers
}

/// Current finalizers minus ours; other controllers' entries are kept
#[must_use]
pub fn without_finalizer(pipeline: &Pipeline) -> Vec<String> {
    pipeline
        .metadata
        .finalizers
        .iter()
        .flatten()
        .filter(|name| *name != PIPELINE_FINALIZER)
        .cloned()
        .collect()
}
