//! Fleet Pipeline Controller Library
//!
//! Reconciles `Pipeline` custom resources against the Grafana Fleet Management
//! Pipeline API.
//!
//! ## Quick Start
//!
//! ```rust
//! use fleet_pipeline_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
