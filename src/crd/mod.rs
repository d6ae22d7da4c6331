//! # Custom Resource Definitions
//!
//! CRD types for the Fleet Pipeline Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - `Pipeline` resource and spec defaults
//! - `source.rs` - Config type and provenance enums with their Fleet Management wire names
//! - `status.rs` - Status and condition types

mod source;
mod spec;
mod status;

pub use source::{ConfigType, PipelineSource, SourceType};
pub use spec::{default_true, Pipeline, PipelineSpec};
pub use status::{Condition, PipelineStatus};
