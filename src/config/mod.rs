//! # Configuration
//!
//! Environment-driven configuration for the controller, the HTTP server and the
//! Fleet Management client.
//!
//! Controller and server settings are shared behind `Arc<RwLock<_>>` so the
//! runtime reads them at the point of use.

pub mod controller;
pub mod fleet;
pub mod server;

pub use controller::ControllerConfig;
pub use fleet::{ConfigError, FleetClientConfig};
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared controller configuration
pub type SharedControllerConfig = Arc<RwLock<ControllerConfig>>;

/// Shared server configuration
pub type SharedServerConfig = Arc<RwLock<ServerConfig>>;

/// Load controller and server configuration from the environment
#[must_use]
pub fn load_config() -> (ControllerConfig, ServerConfig) {
    (ControllerConfig::from_env(), ServerConfig::from_env())
}

/// Create shared configuration instances
#[must_use]
pub fn create_shared_config() -> (SharedControllerConfig, SharedServerConfig) {
    let (controller, server) = load_config();
    (
        Arc::new(RwLock::new(controller)),
        Arc::new(RwLock::new(server)),
    )
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
