//! Shared error types

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// A configuration error is always fatal for the operation that needed the
/// value: TTLs and keys are never defaulted to zero or "forever".
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {key}")]
    Missing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
