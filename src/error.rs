//! Domain error types for scrollcue
//!
//! Provides structured error types for the fallible edges of the engine:
//! - `StorageError` for session-scoped position storage
//! - `ConfigError` for configuration loading
//! - `MotionError` as the top-level error type
//!
//! None of these ever escape the engine's event handling. Components log
//! them and fall back to the non-animated, non-restored behaviour.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for scrollcue
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Target '{0}' is not mounted")]
    MissingTarget(String),

    #[error("Trace error on line {line}: {source}")]
    Trace {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a `SessionStore`
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage is unavailable")]
    Unavailable,

    #[error("Quota exceeded writing '{key}' ({needed} bytes, {limit} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Corrupt entry under '{0}': {1}")]
    Corrupt(String, #[source] serde_json::Error),

    #[error("Failed to encode positions: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Errors related to loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type alias for MotionError
pub type Result<T> = std::result::Result<T, MotionError>;

/// Result type alias for StorageError
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for ConfigError
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_names_key() {
        let err = StorageError::QuotaExceeded {
            key: "scrollcue:positions".to_string(),
            needed: 120,
            limit: 64,
        };
        let msg = err.to_string();
        assert!(msg.contains("scrollcue:positions"));
        assert!(msg.contains("120"));
    }

    #[test]
    fn test_storage_error_converts_to_motion_error() {
        let err: MotionError = StorageError::Unavailable.into();
        assert!(matches!(err, MotionError::Storage(StorageError::Unavailable)));
    }
}
