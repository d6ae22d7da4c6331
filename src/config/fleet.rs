//! # Fleet Management Client Configuration
//!
//! Endpoint and credentials for the Fleet Management Pipeline API.

use crate::constants::{
    DEFAULT_FLEET_POOL_IDLE_TIMEOUT_SECS, DEFAULT_FLEET_REQUESTS_PER_SECOND,
    DEFAULT_FLEET_REQUEST_TIMEOUT_SECS,
};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Fleet Management client configuration
#[derive(Clone)]
pub struct FleetClientConfig {
    /// Base URL of the pipeline service, e.g.
    /// `https://fleet-management-prod-001.grafana.net/pipeline.v1.PipelineService/`
    pub base_url: String,
    /// Basic auth username (Fleet Management stack ID)
    pub username: String,
    /// Basic auth password (access policy token)
    pub password: String,
    /// Client-side request budget, burst of one
    pub requests_per_second: u32,
    pub request_timeout: Duration,
    pub pool_idle_timeout: Duration,
}

impl std::fmt::Debug for FleetClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("requests_per_second", &self.requests_per_second)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl FleetClientConfig {
    /// Build a configuration with default limits
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            username: username.into(),
            password: password.into(),
            requests_per_second: DEFAULT_FLEET_REQUESTS_PER_SECOND,
            request_timeout: Duration::from_secs(DEFAULT_FLEET_REQUEST_TIMEOUT_SECS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_FLEET_POOL_IDLE_TIMEOUT_SECS),
        }
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    /// Returns an error if `FLEET_BASE_URL` is missing or a numeric setting is zero
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Malformed numbers fall back to their defaults.
    ///
    /// # Errors
    /// Returns an error if `FLEET_BASE_URL` is missing or a numeric setting is zero
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("FLEET_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("FLEET_BASE_URL"))?;

        let mut config = Self::new(
            base_url.trim(),
            lookup("FLEET_USERNAME").unwrap_or_default(),
            lookup("FLEET_PASSWORD").unwrap_or_default(),
        );

        if let Some(rps) = parse_optional::<u32>(&lookup, "FLEET_REQUESTS_PER_SECOND") {
            config.requests_per_second = non_zero("FLEET_REQUESTS_PER_SECOND", rps)?;
        }
        if let Some(secs) = parse_optional::<u64>(&lookup, "FLEET_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(non_zero("FLEET_REQUEST_TIMEOUT_SECS", secs)?);
        }

        Ok(config)
    }

    /// Minimum spacing between two requests
    #[must_use]
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }
}

/// Parse an optional numeric setting; malformed values fall back to the default
fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid {}={:?} ({}), using the default", key, raw, e);
            None
        }
    }
}

fn non_zero<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialEq + Default,
{
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

/// Operations are appended to the base URL, so it must end with `/`
fn normalize_base_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_base_url_is_required() {
        let result = FleetClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("FLEET_BASE_URL"));
    }

    #[test]
    fn test_defaults_and_trailing_slash() {
        let config = FleetClientConfig::from_lookup(lookup_from(&[
            ("FLEET_BASE_URL", "https://fleet.example.com/pipeline.v1.PipelineService"),
            ("FLEET_USERNAME", "12345"),
            ("FLEET_PASSWORD", "glc_token"),
        ]))
        .unwrap();

        assert_eq!(
            config.base_url,
            "https://fleet.example.com/pipeline.v1.PipelineService/"
        );
        assert_eq!(config.requests_per_second, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.min_request_interval(), Duration::from_nanos(333_333_333));
    }

    #[test]
    fn test_malformed_numbers_fall_back_to_defaults() {
        let config = FleetClientConfig::from_lookup(lookup_from(&[
            ("FLEET_BASE_URL", "https://fleet.example.com/"),
            ("FLEET_REQUESTS_PER_SECOND", "fast"),
            ("FLEET_REQUEST_TIMEOUT_SECS", "-5"),
        ]))
        .unwrap();

        assert_eq!(config.requests_per_second, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = FleetClientConfig::from_lookup(lookup_from(&[
            ("FLEET_BASE_URL", "https://fleet.example.com/"),
            ("FLEET_REQUESTS_PER_SECOND", " 10 "),
            ("FLEET_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        for key in ["FLEET_REQUESTS_PER_SECOND", "FLEET_REQUEST_TIMEOUT_SECS"] {
            let result = FleetClientConfig::from_lookup(lookup_from(&[
                ("FLEET_BASE_URL", "https://fleet.example.com/"),
                (key, "0"),
            ]));
            assert_eq!(
                result.unwrap_err(),
                ConfigError::Invalid {
                    key,
                    reason: "must be greater than zero".to_string(),
                },
                "{key}=0 must be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = FleetClientConfig::new("https://fleet.example.com/", "user", "secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }
}
