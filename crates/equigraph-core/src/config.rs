//! Engine configuration loaded from TOML files with environment overrides.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    #[error("failed to read configuration: {0}")]
    Read(#[from] Box<figment::Error>),

    /// The configuration was read but carries invalid values.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Retry budget for contended topology mutations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum optimistic attempts before surfacing `Unavailable` (1..=16).
    pub max_attempts: u32,
    /// First backoff delay in milliseconds; doubles per attempt.
    pub base_backoff_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 5,
            max_backoff_ms: 250,
        }
    }
}

/// Bounds for the read-side traversals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum nodes expanded per traversal; any value above the largest
    /// expected group size is safe.
    pub max_walk: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_walk: 10_000 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Retry budget for contended mutations.
    pub retry: RetryConfig,
    /// Read-side traversal bounds.
    pub query: QueryConfig,
}

impl EngineConfig {
    /// Loads configuration from a TOML file merged with `EQUIGRAPH_*`
    /// environment overrides (e.g. `EQUIGRAPH_RETRY__MAX_ATTEMPTS=8`).
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("EQUIGRAPH_").split("__"))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configured values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.retry.max_attempts) {
            return Err(ConfigError::Invalid(format!(
                "retry.max_attempts must be between 1 and 16, got {}",
                self.retry.max_attempts
            )));
        }
        if self.retry.max_backoff_ms < self.retry.base_backoff_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.max_backoff_ms ({}) must not be below retry.base_backoff_ms ({})",
                self.retry.max_backoff_ms, self.retry.base_backoff_ms
            )));
        }
        if self.query.max_walk == 0 {
            return Err(ConfigError::Invalid(
                "query.max_walk must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
