//! Session token record entity.

use serde::{Deserialize, Serialize};

/// The single session-token slot of a user.
///
/// There is at most one record per `uid`; issuing again overwrites it in
/// place. Fields other than `uid` are optional because a stored row may lack
/// them, and an absent field must never be read as "valid".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Opaque user identity
    pub uid: String,

    /// Current access token
    #[serde(default)]
    pub token: Option<String>,

    /// Epoch seconds at which `token` was generated
    #[serde(default, rename = "token_time")]
    pub token_issued_at: Option<i64>,

    /// Current refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Epoch seconds at which `refresh_token` was generated
    #[serde(default, rename = "refresh_token_time")]
    pub refresh_token_issued_at: Option<i64>,
}

impl TokenRecord {
    /// Creates a record holding a freshly issued pair
    pub fn issued(
        uid: impl Into<String>,
        token: impl Into<String>,
        refresh_token: impl Into<String>,
        issued_at: i64,
    ) -> Self {
        Self {
            uid: uid.into(),
            token: Some(token.into()),
            token_issued_at: Some(issued_at),
            refresh_token: Some(refresh_token.into()),
            refresh_token_issued_at: Some(issued_at),
        }
    }

    /// Whether the record currently holds an access token
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Whether `presented` equals the stored access token
    pub fn token_matches(&self, presented: &str) -> bool {
        self.has_token() && self.token.as_deref() == Some(presented)
    }

    /// Apply every field set in `patch`, leaving the rest untouched
    pub fn apply(&mut self, patch: &TokenRecordPatch) {
        if let Some(token) = &patch.token {
            self.token = Some(token.clone());
        }
        if let Some(at) = patch.token_issued_at {
            self.token_issued_at = Some(at);
        }
        if let Some(refresh) = &patch.refresh_token {
            self.refresh_token = Some(refresh.clone());
        }
        if let Some(at) = patch.refresh_token_issued_at {
            self.refresh_token_issued_at = Some(at);
        }
    }
}

/// Partial update of a [`TokenRecord`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecordPatch {
    pub token: Option<String>,
    pub token_issued_at: Option<i64>,
    pub refresh_token: Option<String>,
    pub refresh_token_issued_at: Option<i64>,
}

impl TokenRecordPatch {
    /// Patch replacing all four token and time fields
    pub fn rotation(token: impl Into<String>, refresh_token: impl Into<String>, issued_at: i64) -> Self {
        Self {
            token: Some(token.into()),
            token_issued_at: Some(issued_at),
            refresh_token: Some(refresh_token.into()),
            refresh_token_issued_at: Some(issued_at),
        }
    }

    /// A patch with no fields set is malformed input for an update
    pub fn is_empty(&self) -> bool {
        self.token.is_none()
            && self.token_issued_at.is_none()
            && self.refresh_token.is_none()
            && self.refresh_token_issued_at.is_none()
    }
}

/// Result of an issuance or rotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTokens {
    /// Whether the store write succeeded. The pair is returned either way.
    pub success: bool,

    /// Newly minted access token
    pub token: String,

    /// Newly minted refresh token
    pub refresh_token: String,

    /// Access token validity in seconds
    pub token_expires_in: i64,

    /// Refresh token validity in seconds
    pub refresh_expires_in: i64,
}
