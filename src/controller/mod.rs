//! # Controller
//!
//! Reconciliation logic, retry backoff and the metrics and health server.

pub mod backoff;
pub mod reconciler;
pub mod server;
