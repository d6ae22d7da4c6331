//! # Observability
//!
//! Metrics for monitoring the controller.

pub mod metrics;
