//! # Runtime
//!
//! Process bootstrap and the kube-runtime trigger layer.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
