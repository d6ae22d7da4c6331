//! # Conditions
//!
//! Condition list maintenance: one entry per type, kept sorted by type, with
//! `lastTransitionTime` moving only when the status value changes.

use crate::crd::Condition;
use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

/// Build a condition stamped with `now`
#[must_use]
pub fn new_condition(
    r#type: &str,
    status: ConditionStatus,
    reason: &str,
    message: impl Into<String>,
    observed_generation: i64,
    now: DateTime<Utc>,
) -> Condition {
    Condition {
        r#type: r#type.to_string(),
        status: status.as_str().to_string(),
        observed_generation: Some(observed_generation),
        last_transition_time: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
        reason: Some(reason.to_string()),
        message: Some(message.into()),
    }
}

/// Insert or replace the condition of the same type
///
/// An existing entry with the same status keeps its `lastTransitionTime`.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) {
    match conditions.iter().position(|c| c.r#type == condition.r#type) {
        Some(index) => {
            if conditions[index].status == condition.status {
                condition
                    .last_transition_time
                    .clone_from(&conditions[index].last_transition_time);
            }
            conditions[index] = condition;
        }
        None => conditions.push(condition),
    }
    conditions.sort_by(|a, b| a.r#type.cmp(&b.r#type));
    conditions.dedup_by(|a, b| a.r#type == b.r#type);
}
