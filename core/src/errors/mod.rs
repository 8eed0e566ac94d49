//! Domain-specific error types and error handling.
//!
//! Validation failures (`NOT_FOUND`, `EXPIRED`) are not errors: they are
//! returned as [`ValidationOutcome`](crate::domain::ValidationOutcome)
//! values. Everything in [`DomainError`] is a server-side fault.

use st_shared::errors::ConfigError;
use thiserror::Error;

/// Core domain faults
#[derive(Error, Debug)]
pub enum DomainError {
    /// Required configuration is missing or invalid
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The record store or cache failed
    #[error("Store error: {message}")]
    Store { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Stable error code for the service layer
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Configuration { .. } => "CONFIGURATION_ERROR",
            DomainError::Store { .. } => "STORE_ERROR",
            DomainError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        DomainError::Configuration {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests;
