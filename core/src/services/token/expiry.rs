//! Expiry policy: pure time-window checks evaluated at read time.

use st_shared::config::TokenConfig;

/// Whether a credential issued at `issued_at` is past its window at `now`.
///
/// The boundary `now - issued_at == ttl_seconds` is still valid.
pub fn is_expired(issued_at: i64, ttl_seconds: i64, now: i64) -> bool {
    now.saturating_sub(issued_at) > ttl_seconds
}

/// Validity windows for access and refresh tokens, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub token_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl ExpiryPolicy {
    pub fn new(token_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            token_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.token_ttl_seconds, config.refresh_ttl_seconds)
    }

    /// Access token window check; a missing or zero timestamp is expired
    pub fn token_expired(&self, issued_at: Option<i64>, now: i64) -> bool {
        window_expired(issued_at, self.token_ttl_seconds, now)
    }

    /// Refresh token window check; a missing or zero timestamp is expired
    pub fn refresh_expired(&self, issued_at: Option<i64>, now: i64) -> bool {
        window_expired(issued_at, self.refresh_ttl_seconds, now)
    }
}

fn window_expired(issued_at: Option<i64>, ttl_seconds: i64, now: i64) -> bool {
    match issued_at {
        Some(at) if at > 0 => is_expired(at, ttl_seconds, now),
        _ => true,
    }
}
