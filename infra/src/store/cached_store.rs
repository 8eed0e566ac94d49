//! Read-through cache in front of a [`TokenStore`].
//!
//! Keyed reads consult the cache first and populate it on a miss. Unkeyed
//! reads (lookups by token value) always go to the inner store.
//!
//! A miss-fill and a write for the same key never interleave: both run
//! under the key's lock stripe. Writes clear the key before touching the
//! inner store and again afterwards, so a failed invalidation either aborts
//! the write or leaves the key already empty.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use st_core::domain::entities::{TokenRecord, TokenRecordPatch};
use st_core::errors::DomainError;
use st_core::repositories::{CacheKey, RecordFilter, TokenStore};

use crate::cache::RecordCache;

/// Number of lock stripes shared by all keys
const LOCK_STRIPES: usize = 64;

/// Token store decorator adding a record cache
pub struct CachedTokenStore<S, C> {
    inner: S,
    cache: C,
    stripes: Vec<Mutex<()>>,
}

impl<S: TokenStore, C: RecordCache> CachedTokenStore<S, C> {
    pub fn new(inner: S, cache: C) -> Self {
        Self {
            inner,
            cache,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// The backing store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    async fn lock(&self, cache_key: &CacheKey) -> MutexGuard<'_, ()> {
        self.stripes[stripe_index(cache_key)].lock().await
    }

    async fn invalidate(&self, cache_key: &CacheKey) -> Result<(), DomainError> {
        self.cache.invalidate(cache_key).await.map_err(|e| {
            error!("Failed to invalidate cached record '{}': {}", cache_key, e);
            DomainError::from(e)
        })?;
        Ok(())
    }
}

/// Stripe guarding `cache_key`
pub(crate) fn stripe_index(cache_key: &CacheKey) -> usize {
    let mut hasher = DefaultHasher::new();
    cache_key.as_str().hash(&mut hasher);
    (hasher.finish() % LOCK_STRIPES as u64) as usize
}

#[async_trait]
impl<S: TokenStore, C: RecordCache> TokenStore for CachedTokenStore<S, C> {
    async fn get_row(
        &self,
        filter: &RecordFilter,
        cache_key: Option<&CacheKey>,
    ) -> Result<Option<TokenRecord>, DomainError> {
        let Some(key) = cache_key else {
            return self.inner.get_row(filter, None).await;
        };

        if let Some(record) = self.cache.get(key).await? {
            if filter.matches(&record) {
                debug!("Cache hit for '{}'", key);
                return Ok(Some(record));
            }
        }

        let _guard = self.lock(key).await;

        // A fill may have completed while waiting for the stripe
        if let Some(record) = self.cache.get(key).await? {
            if filter.matches(&record) {
                return Ok(Some(record));
            }
            // Entry under this key no longer satisfies the filter
            self.invalidate(key).await?;
        }

        let record = self.inner.get_row(filter, Some(key)).await?;
        if let Some(record) = &record {
            self.cache.put(key, record).await?;
        }
        Ok(record)
    }

    async fn insert_row(&self, record: &TokenRecord, cache_key: &CacheKey) -> Result<bool, DomainError> {
        let _guard = self.lock(cache_key).await;
        self.invalidate(cache_key).await?;
        let inserted = self.inner.insert_row(record, cache_key).await?;
        self.invalidate(cache_key).await?;
        Ok(inserted)
    }

    async fn update_row(
        &self,
        filter: &RecordFilter,
        patch: &TokenRecordPatch,
        cache_key: &CacheKey,
    ) -> Result<bool, DomainError> {
        let _guard = self.lock(cache_key).await;
        self.invalidate(cache_key).await?;
        let updated = self.inner.update_row(filter, patch, cache_key).await?;
        self.invalidate(cache_key).await?;
        Ok(updated)
    }

    async fn delete_row(&self, filter: &RecordFilter, cache_key: &CacheKey) -> Result<bool, DomainError> {
        let _guard = self.lock(cache_key).await;
        self.invalidate(cache_key).await?;
        let deleted = self.inner.delete_row(filter, cache_key).await?;
        self.invalidate(cache_key).await?;
        Ok(deleted)
    }
}
