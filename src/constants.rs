//! # Constants
//!
//! Shared constants used throughout the controller.

/// Finalizer token guarding remote pipeline cleanup
pub const PIPELINE_FINALIZER: &str = "pipeline.fleetmanagement.grafana.com/finalizer";

/// Condition type: remote pipeline exists and matches the desired spec
pub const CONDITION_READY: &str = "Ready";

/// Condition type: outcome of the most recent sync attempt
pub const CONDITION_SYNCED: &str = "Synced";

/// Condition reason for a successful upsert
pub const REASON_SYNCED: &str = "Synced";

/// Condition reason for a retriable upsert failure
pub const REASON_SYNC_FAILED: &str = "SyncFailed";

/// Condition reason for a request rejected by Fleet Management (or built from an invalid spec)
pub const REASON_VALIDATION_ERROR: &str = "ValidationError";

/// Condition reason for a failed remote delete
pub const REASON_DELETE_FAILED: &str = "DeleteFailed";

/// Fleet Management operation name for upserts
pub const OPERATION_UPSERT: &str = "UpsertPipeline";

/// Fleet Management operation name for deletes
pub const OPERATION_DELETE: &str = "DeletePipeline";

/// Maximum number of matchers accepted on a single pipeline
pub const MAX_MATCHERS: usize = 100;

/// Maximum length of a single matcher expression
pub const MAX_MATCHER_LENGTH: usize = 200;

/// Default metrics server port
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default server startup timeout in seconds
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default server poll interval in milliseconds
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default Fleet Management request budget (requests per second, burst of one)
pub const DEFAULT_FLEET_REQUESTS_PER_SECOND: u32 = 3;

/// Default Fleet Management request timeout in seconds
pub const DEFAULT_FLEET_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Idle pooled connections are dropped after this many seconds
pub const DEFAULT_FLEET_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Fixed requeue delay after Fleet Management answers 429
pub const DEFAULT_RATE_LIMIT_REQUEUE_SECS: u64 = 10;

/// Default exponential backoff start in milliseconds
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default exponential backoff cap in milliseconds (5 minutes)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000;

/// Default watch restart delay in seconds
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default watch restart delay after stream ends in seconds
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default maximum concurrent reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Upper bound on one remote call including the client-side rate limit wait
pub const DEFAULT_REMOTE_CALL_TIMEOUT_SECS: u64 = 60;
