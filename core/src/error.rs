use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum PlaitError {
    /// The entity type was never defined in the registry
    #[error("Unknown entity type `{0}`")]
    UnknownEntity(CompactString),

    /// An include (or association lookup) names a pair that was never registered
    #[error("Unknown association at `{path}`: `{entity}` has no association `{target}`")]
    UnknownAssociation {
        path: CompactString,
        entity: CompactString,
        target: CompactString,
    },

    /// A `where` or `order` clause references something the target does not have
    #[error("Invalid include at `{path}`: {reason}")]
    InvalidInclude { path: CompactString, reason: String },

    /// The planner cannot guarantee correct pagination for this include tree
    #[error("Unsupported include combination at `{path}`: {reason}")]
    UnsupportedIncludeCombination { path: CompactString, reason: String },

    /// Invalid entity or association declaration
    #[error("Schema error: {0}")]
    Schema(String),

    /// Storage failure, passed through unmodified
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failure reported by a [`Backend`](crate::Backend).
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error executing a query
    #[error("Query error: {0}")]
    Query(String),

    /// The round trip exceeded the caller-supplied timeout
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// Rusqlite specific errors
    #[cfg(feature = "rusqlite")]
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl PlaitError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        PlaitError::InvalidInclude {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(path: &str, reason: impl Into<String>) -> Self {
        PlaitError::UnsupportedIncludeCombination {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for plait operations
pub type Result<T> = std::result::Result<T, PlaitError>;
