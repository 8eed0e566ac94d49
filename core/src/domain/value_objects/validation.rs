//! Outcome of validating a presented token.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{IssuedTokens, TokenRecord};

/// Closed set of validation results.
///
/// No other outcome exists: store and cache failures are reported as
/// [`DomainError`](crate::errors::DomainError), never folded into `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Ok,
    NotFound,
    Expired,
}

impl ValidationStatus {
    /// Numeric result code stored and exchanged by existing callers
    pub fn code(&self) -> u8 {
        match self {
            ValidationStatus::Ok => 1,
            ValidationStatus::NotFound => 2,
            ValidationStatus::Expired => 3,
        }
    }

    /// Response code the service layer sends for this status
    pub fn response_code(&self) -> u16 {
        match self {
            ValidationStatus::Ok => 2000,
            ValidationStatus::NotFound => 4000,
            ValidationStatus::Expired => 4220,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationStatus::Ok)
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Ok => write!(f, "OK"),
            ValidationStatus::NotFound => write!(f, "NOT_FOUND"),
            ValidationStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Status, human-readable message and, for lookups by token value, the
/// matching record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<TokenRecord>,
}

impl ValidationOutcome {
    pub fn ok(record: Option<TokenRecord>) -> Self {
        Self {
            status: ValidationStatus::Ok,
            message: String::from("ok"),
            record,
        }
    }

    pub fn token_not_found() -> Self {
        Self::rejected(ValidationStatus::NotFound, "invalid token")
    }

    pub fn token_expired() -> Self {
        Self::rejected(ValidationStatus::Expired, "token expired")
    }

    pub fn refresh_not_found() -> Self {
        Self::rejected(ValidationStatus::NotFound, "invalid refresh token")
    }

    pub fn refresh_expired() -> Self {
        Self::rejected(ValidationStatus::Expired, "refresh token expired")
    }

    fn rejected(status: ValidationStatus, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            record: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

/// Result of exchanging a refresh token for a new pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh token was valid and the pair has been rotated
    Rotated(IssuedTokens),
    /// The refresh token was rejected; nothing was written
    Rejected(ValidationOutcome),
}
