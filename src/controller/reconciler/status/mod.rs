//! # Status
//!
//! Outcome recording on `PipelineStatus`. These functions only mutate an owned
//! status value; committing it is the reconciler's job.

mod conditions;

pub use conditions::{new_condition, set_condition, ConditionStatus};

use crate::constants::{CONDITION_READY, CONDITION_SYNCED, REASON_DELETE_FAILED, REASON_SYNCED};
use crate::crd::PipelineStatus;
use crate::provider::fleet::RemotePipeline;
use chrono::{DateTime, SecondsFormat, Utc};

/// Record a successful upsert of `generation`
pub fn record_success(
    status: &mut PipelineStatus,
    remote: &RemotePipeline,
    generation: i64,
    now: DateTime<Utc>,
) {
    status.id = Some(remote.id.clone());
    status.observed_generation = Some(generation);
    if let Some(created_at) = remote.created_at {
        status.created_at = Some(created_at.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    if let Some(updated_at) = remote.updated_at {
        status.updated_at = Some(updated_at.to_rfc3339_opts(SecondsFormat::Secs, true));
    }
    if let Some(revision) = remote.revision_id.as_deref().filter(|r| !r.is_empty()) {
        status.revision_id = Some(revision.to_string());
    }

    set_condition(
        &mut status.conditions,
        new_condition(
            CONDITION_READY,
            ConditionStatus::True,
            REASON_SYNCED,
            "Pipeline successfully synced to Fleet Management",
            generation,
            now,
        ),
    );
    set_condition(
        &mut status.conditions,
        new_condition(
            CONDITION_SYNCED,
            ConditionStatus::True,
            REASON_SYNCED,
            format!("UpsertPipeline succeeded, ID: {}", remote.id),
            generation,
            now,
        ),
    );
}

/// Record a failed sync attempt of `generation`
///
/// `observedGeneration` only advances for failures that are final for this
/// generation (validation); retriable failures leave it behind so the retry is
/// not skipped by the generation gate.
pub fn record_failure(
    status: &mut PipelineStatus,
    reason: &str,
    message: &str,
    generation: i64,
    advance_observed_generation: bool,
    now: DateTime<Utc>,
) {
    if advance_observed_generation {
        status.observed_generation = Some(generation);
    }
    for r#type in [CONDITION_READY, CONDITION_SYNCED] {
        set_condition(
            &mut status.conditions,
            new_condition(r#type, ConditionStatus::False, reason, message, generation, now),
        );
    }
}

/// Record a failed remote delete; Ready is left as it was
pub fn record_delete_failure(
    status: &mut PipelineStatus,
    message: &str,
    generation: i64,
    now: DateTime<Utc>,
) {
    set_condition(
        &mut status.conditions,
        new_condition(
            CONDITION_SYNCED,
            ConditionStatus::False,
            REASON_DELETE_FAILED,
            message,
            generation,
            now,
        ),
    );
}
