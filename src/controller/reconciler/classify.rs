//! # Error Classification
//!
//! Maps a failed Fleet Management call to exactly one disposition. The
//! reconciler matches on the result and never re-inspects the error.

use crate::provider::SyncError;

/// Disposition of a failed remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// 400: the request is wrong and retrying will not help
    Validation { message: String },
    /// 404: the remote pipeline is gone
    NotFound,
    /// 429: retry after the fixed rate-limit delay
    RateLimited,
    /// Any other status, transport failure, timeout or cancellation
    ServerOrTransport { message: String },
}

impl Classification {
    /// Label used in metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Validation { .. } => "validation",
            Classification::NotFound => "not_found",
            Classification::RateLimited => "rate_limited",
            Classification::ServerOrTransport { .. } => "server_or_transport",
        }
    }
}

#[must_use]
pub fn classify(error: &SyncError) -> Classification {
    match error {
        SyncError::Api {
            status: 400,
            message,
            ..
        } => Classification::Validation {
            message: message.clone(),
        },
        SyncError::Api { status: 404, .. } => Classification::NotFound,
        SyncError::Api { status: 429, .. } => Classification::RateLimited,
        SyncError::Api { .. } | SyncError::Transport(_) | SyncError::Cancelled => {
            Classification::ServerOrTransport {
                message: error.to_string(),
            }
        }
    }
}
