//! Session token lifecycle service

use st_shared::config::TokenConfig;
use st_shared::utils::mask_token;
use tracing::{debug, info, warn};

use crate::domain::entities::{IssuedTokens, TokenRecord, TokenRecordPatch};
use crate::domain::value_objects::{RefreshOutcome, ValidationOutcome};
use crate::errors::DomainError;
use crate::repositories::{CacheKey, RecordFilter, TokenStore};

use super::clock::{Clock, SystemClock};
use super::codec::{generate_nonce, TokenCodec, TokenInput};
use super::expiry::ExpiryPolicy;

/// Issues, validates, rotates and revokes the session token of each user.
///
/// One instance per service scope, built around an injected store. There is
/// no process-wide registry of instances.
///
/// Concurrent issuance for the same uid is not serialized: both callers read
/// the slot, both write, and which pair survives depends on store and cache
/// ordering. Each individual store write is atomic for its record.
pub struct TokenLifecycleService<S: TokenStore, C: Clock = SystemClock> {
    store: S,
    codec: TokenCodec,
    expiry: ExpiryPolicy,
    clock: C,
}

impl<S: TokenStore> TokenLifecycleService<S, SystemClock> {
    /// Creates a service using the wall clock
    ///
    /// # Arguments
    ///
    /// * `store` - Record store, usually cache-fronted
    /// * `config` - Token key material and TTLs
    ///
    /// # Returns
    ///
    /// The service, or `DomainError::Configuration` if `config` is incomplete
    pub fn new(store: S, config: &TokenConfig) -> Result<Self, DomainError> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: TokenStore, C: Clock> TokenLifecycleService<S, C> {
    /// Creates a service with an explicit time source
    pub fn with_clock(store: S, config: &TokenConfig, clock: C) -> Result<Self, DomainError> {
        config.validate()?;

        Ok(Self {
            store,
            codec: TokenCodec::new(config),
            expiry: ExpiryPolicy::from_config(config),
            clock,
        })
    }

    /// The underlying record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The validity windows in force
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry
    }

    /// Generates a fresh token pair for `uid` and stores it in the user's
    /// slot, inserting on first issuance and overwriting in place afterwards.
    ///
    /// The pair is returned even when the store reports the write as not
    /// applied; `success` carries that flag.
    ///
    /// # Arguments
    ///
    /// * `uid` - The user identity
    /// * `secret` - Credential-derived secret material
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedTokens)` - The new pair and the write's success flag
    /// * `Err(DomainError)` - Store or cache failure
    pub async fn issue_or_rotate(&self, uid: &str, secret: &str) -> Result<IssuedTokens, DomainError> {
        let cache_key = CacheKey::for_uid(uid);
        let existing = self
            .store
            .get_row(&RecordFilter::Uid(uid.to_string()), Some(&cache_key))
            .await?;

        let now = self.clock.now();
        let nonce = generate_nonce();
        let (token, refresh_token) = self.codec.generate_pair(&TokenInput {
            uid,
            secret,
            issued_at: now,
            nonce: &nonce,
        })?;

        let success = match existing {
            None => {
                let record = TokenRecord::issued(uid, token.clone(), refresh_token.clone(), now);
                self.store.insert_row(&record, &cache_key).await?
            }
            Some(_) => {
                let patch = TokenRecordPatch::rotation(token.clone(), refresh_token.clone(), now);
                self.store
                    .update_row(&RecordFilter::Uid(uid.to_string()), &patch, &cache_key)
                    .await?
            }
        };

        if success {
            info!(uid = %uid, token = %mask_token(&token), "Issued session token");
        } else {
            warn!(uid = %uid, "Session token issued but the store did not apply the write");
        }

        Ok(IssuedTokens {
            success,
            token,
            refresh_token,
            token_expires_in: self.expiry.token_ttl_seconds,
            refresh_expires_in: self.expiry.refresh_ttl_seconds,
        })
    }

    /// Checks `presented` against the token stored for `uid`
    ///
    /// # Returns
    ///
    /// * `NotFound` - No record for `uid`, or the stored token differs
    /// * `Expired` - The stored token is past its window
    /// * `Ok` - Valid
    pub async fn validate_by_uid(&self, uid: &str, presented: &str) -> Result<ValidationOutcome, DomainError> {
        let record = match self.get_record(uid).await? {
            Some(record) if record.token_matches(presented) => record,
            _ => {
                debug!(uid = %uid, "Token does not match stored record");
                return Ok(ValidationOutcome::token_not_found());
            }
        };

        if self.expiry.token_expired(record.token_issued_at, self.clock.now()) {
            debug!(uid = %uid, "Token expired");
            return Ok(ValidationOutcome::token_expired());
        }

        Ok(ValidationOutcome::ok(None))
    }

    /// Resolves a bearer token to its record without knowing the uid.
    ///
    /// The lookup goes to the store directly; token values are not a cache
    /// key.
    pub async fn validate_token(&self, presented: &str) -> Result<ValidationOutcome, DomainError> {
        if presented.is_empty() {
            return Ok(ValidationOutcome::token_not_found());
        }

        let record = self
            .store
            .get_row(&RecordFilter::Token(presented.to_string()), None)
            .await?;

        let record = match record {
            Some(record) if record.has_token() => record,
            _ => {
                debug!(token = %mask_token(presented), "Unknown token");
                return Ok(ValidationOutcome::token_not_found());
            }
        };

        if self.expiry.token_expired(record.token_issued_at, self.clock.now()) {
            debug!(uid = %record.uid, "Token expired");
            return Ok(ValidationOutcome::token_expired());
        }

        Ok(ValidationOutcome::ok(Some(record)))
    }

    /// Resolves a refresh token to its record, checked against the refresh
    /// window only.
    pub async fn validate_refresh_token(&self, presented: &str) -> Result<ValidationOutcome, DomainError> {
        if presented.is_empty() {
            return Ok(ValidationOutcome::refresh_not_found());
        }

        let record = self
            .store
            .get_row(&RecordFilter::RefreshToken(presented.to_string()), None)
            .await?;

        // An empty result and a row without an access token are the same
        // rejection.
        let record = match record {
            None => {
                debug!(token = %mask_token(presented), "Unknown refresh token");
                return Ok(ValidationOutcome::refresh_not_found());
            }
            Some(record) if !record.has_token() => {
                debug!(uid = %record.uid, "Refresh token belongs to a record without a token");
                return Ok(ValidationOutcome::refresh_not_found());
            }
            Some(record) => record,
        };

        if self
            .expiry
            .refresh_expired(record.refresh_token_issued_at, self.clock.now())
        {
            debug!(uid = %record.uid, "Refresh token expired");
            return Ok(ValidationOutcome::refresh_expired());
        }

        Ok(ValidationOutcome::ok(Some(record)))
    }

    /// Exchanges a valid refresh token for a new pair.
    ///
    /// The presented refresh token is the secret material for the new pair,
    /// so no primary credentials are needed. Rejections are returned
    /// without writing anything.
    pub async fn refresh(&self, presented_refresh_token: &str) -> Result<RefreshOutcome, DomainError> {
        let outcome = self.validate_refresh_token(presented_refresh_token).await?;

        let uid = match (&outcome.record, outcome.is_ok()) {
            (Some(record), true) => record.uid.clone(),
            _ => return Ok(RefreshOutcome::Rejected(outcome)),
        };

        let issued = self.issue_or_rotate(&uid, presented_refresh_token).await?;
        Ok(RefreshOutcome::Rotated(issued))
    }

    /// Deletes the record for `uid` from store and cache.
    ///
    /// Revoking a uid without a record succeeds.
    pub async fn revoke(&self, uid: &str) -> Result<bool, DomainError> {
        let removed = self
            .store
            .delete_row(&RecordFilter::Uid(uid.to_string()), &CacheKey::for_uid(uid))
            .await?;

        if removed {
            info!(uid = %uid, "Revoked session token");
        } else {
            debug!(uid = %uid, "Revoke requested for uid without a session token");
        }

        Ok(true)
    }

    /// Reads the record for `uid` through the cache
    pub async fn get_record(&self, uid: &str) -> Result<Option<TokenRecord>, DomainError> {
        self.store
            .get_row(&RecordFilter::Uid(uid.to_string()), Some(&CacheKey::for_uid(uid)))
            .await
    }

    /// Applies a partial update to the record for `uid`.
    ///
    /// An empty patch is rejected with `Ok(false)` before reaching the store.
    pub async fn update_record(&self, uid: &str, patch: &TokenRecordPatch) -> Result<bool, DomainError> {
        if patch.is_empty() {
            warn!(uid = %uid, "Rejected empty token record update");
            return Ok(false);
        }

        self.store
            .update_row(&RecordFilter::Uid(uid.to_string()), patch, &CacheKey::for_uid(uid))
            .await
    }
}
