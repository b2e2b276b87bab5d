//! Configuration types for plait.toml

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Planner and executor configuration.
///
/// ```toml
/// where_implies_required = true
/// separate_collections = true
/// max_bind_params = 999
/// timeout_ms = 5000
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// An include with a `where` clause and no explicit `required` flag
    /// behaves as required, so it constrains the root set.
    pub where_implies_required: bool,
    /// Load non-required collection includes with a follow-up query instead
    /// of a LEFT JOIN.
    pub separate_collections: bool,
    /// Largest number of keys bound into one `IN (...)` list; longer key
    /// lists are split over several round trips.
    pub max_bind_params: usize,
    /// Per round trip timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_max_bind_params() -> usize {
    // SQLITE_MAX_VARIABLE_NUMBER before 3.32
    999
}

impl Default for Config {
    fn default() -> Self {
        Self {
            where_implies_required: true,
            separate_collections: true,
            max_bind_params: default_max_bind_params(),
            timeout_ms: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(s).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        if config.max_bind_params == 0 {
            return Err(ConfigError::ParseError(
                "max_bind_params must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_where_implies_required(mut self, value: bool) -> Self {
        self.where_implies_required = value;
        self
    }

    pub fn with_separate_collections(mut self, value: bool) -> Self {
        self.separate_collections = value;
        self
    }

    pub fn with_max_bind_params(mut self, value: usize) -> Self {
        self.max_bind_params = value.max(1);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}
