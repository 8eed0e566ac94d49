//! Session token configuration

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// Environment variable holding the server public key
pub const ENV_PUBLIC_KEY: &str = "TOKEN_PUBLIC_KEY";
/// Environment variable holding the server secret key
pub const ENV_SECRET_KEY: &str = "TOKEN_SECRET_KEY";
/// Environment variable holding the access token TTL in seconds
pub const ENV_TOKEN_TTL: &str = "TOKEN_EXPIRE_TIME";
/// Environment variable holding the refresh token TTL in seconds
pub const ENV_REFRESH_TTL: &str = "TOKEN_REFRESH_EXPIRE_TIME";

/// Key material and validity windows for session tokens.
///
/// `Debug` redacts both keys; neither key may reach a log line or an error
/// message.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Server public key mixed into every token
    pub public_key: String,

    /// Server secret key, used as the MAC key
    pub secret_key: String,

    /// Access token validity window in seconds
    pub token_ttl_seconds: i64,

    /// Refresh token validity window in seconds
    pub refresh_ttl_seconds: i64,
}

impl TokenConfig {
    /// Create a token configuration from its four required values
    pub fn new(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
        token_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            token_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Create from environment variables.
    ///
    /// Unlike the other sub-configurations there are no fallbacks: every
    /// value must be present and valid.
    pub fn from_env() -> ConfigResult<Self> {
        let public_key = require_env(ENV_PUBLIC_KEY)?;
        let secret_key = require_env(ENV_SECRET_KEY)?;
        let token_ttl_seconds = parse_seconds(ENV_TOKEN_TTL, &require_env(ENV_TOKEN_TTL)?)?;
        let refresh_ttl_seconds =
            parse_seconds(ENV_REFRESH_TTL, &require_env(ENV_REFRESH_TTL)?)?;

        let config = Self {
            public_key,
            secret_key,
            token_ttl_seconds,
            refresh_ttl_seconds,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that keys are present and both TTLs are positive
    pub fn validate(&self) -> ConfigResult<()> {
        if self.public_key.trim().is_empty() {
            return Err(ConfigError::missing("token.public_key"));
        }
        if self.secret_key.trim().is_empty() {
            return Err(ConfigError::missing("token.secret_key"));
        }
        if self.token_ttl_seconds <= 0 {
            return Err(ConfigError::invalid(
                "token.token_ttl_seconds",
                "must be a positive number of seconds",
            ));
        }
        if self.refresh_ttl_seconds <= 0 {
            return Err(ConfigError::invalid(
                "token.refresh_ttl_seconds",
                "must be a positive number of seconds",
            ));
        }
        Ok(())
    }

    /// Set access token TTL in minutes, saturating at `i64::MAX` seconds
    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl_seconds = minutes.saturating_mul(60);
        self
    }

    /// Set refresh token TTL in days, saturating at `i64::MAX` seconds
    pub fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_ttl_seconds = days.saturating_mul(86400);
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("public_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

fn require_env(key: &str) -> ConfigResult<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::missing(key)),
    }
}

fn parse_seconds(key: &str, raw: &str) -> ConfigResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::invalid(key, e.to_string()))
}
