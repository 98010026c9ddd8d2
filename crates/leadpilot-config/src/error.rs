//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Environment override could not be parsed.
    #[error("invalid environment override")]
    InvalidEnv {
        /// Variable name.
        key: String,
        /// Raw value supplied.
        value: String,
    },
    /// Config file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Config file was not valid JSON for the schema.
    #[error("failed to parse configuration file")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Source serde error.
        source: serde_json::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        section: &'static str,
        field: &'static str,
        value: impl ToString,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section,
            field,
            value: Some(value.to_string()),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
