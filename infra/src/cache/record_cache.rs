//! Cached copies of token records
//!
//! The cache is a derived view of the record store keyed by
//! `user_token/<uid>`. Entries are written on read-through and removed on
//! every store write; nothing here decides token validity.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use st_core::domain::entities::TokenRecord;
use st_core::repositories::CacheKey;
use st_shared::config::CacheConfig;

use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Key-value cache of token records
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Fetch the cached record, `None` on a miss
    async fn get(&self, key: &CacheKey) -> Result<Option<TokenRecord>, InfrastructureError>;

    /// Store a copy of `record` under `key`
    async fn put(&self, key: &CacheKey, record: &TokenRecord) -> Result<(), InfrastructureError>;

    /// Drop the entry under `key`; true if one existed
    async fn invalidate(&self, key: &CacheKey) -> Result<bool, InfrastructureError>;
}

#[async_trait]
impl<T: RecordCache + ?Sized> RecordCache for Box<T> {
    async fn get(&self, key: &CacheKey) -> Result<Option<TokenRecord>, InfrastructureError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &CacheKey, record: &TokenRecord) -> Result<(), InfrastructureError> {
        (**self).put(key, record).await
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, InfrastructureError> {
        (**self).invalidate(key).await
    }
}

/// Records stored in Redis as JSON with a bounded lifetime
#[derive(Clone)]
pub struct RedisRecordCache {
    client: RedisClient,
    key_prefix: Option<String>,
    ttl_seconds: u64,
}

impl RedisRecordCache {
    /// Build a cache over `client`, taking key prefix and entry TTL from
    /// `config`
    pub fn new(client: RedisClient, config: &CacheConfig) -> Self {
        Self {
            client,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.default_ttl,
        }
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        redis_key(self.key_prefix.as_deref(), key)
    }
}

/// Full Redis key for a cache key, with the optional deployment prefix
pub(crate) fn redis_key(prefix: Option<&str>, key: &CacheKey) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key.as_str()),
        None => key.as_str().to_string(),
    }
}

#[async_trait]
impl RecordCache for RedisRecordCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<TokenRecord>, InfrastructureError> {
        match self.client.get(&self.redis_key(key)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, record: &TokenRecord) -> Result<(), InfrastructureError> {
        let json = serde_json::to_string(record)?;
        self.client
            .set_with_expiry(&self.redis_key(key), &json, self.ttl_seconds)
            .await
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, InfrastructureError> {
        self.client.delete(&self.redis_key(key)).await
    }
}

/// In-process record cache without expiry.
///
/// Clones share the same map. Suitable for a single node; with several
/// nodes each holds its own copy and invalidation does not propagate.
#[derive(Clone, Default)]
pub struct MemoryRecordCache {
    entries: Arc<RwLock<HashMap<String, TokenRecord>>>,
}

impl MemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry exists under `key`
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().await.contains_key(key.as_str())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<TokenRecord>, InfrastructureError> {
        Ok(self.entries.read().await.get(key.as_str()).cloned())
    }

    async fn put(&self, key: &CacheKey, record: &TokenRecord) -> Result<(), InfrastructureError> {
        self.entries
            .write()
            .await
            .insert(key.as_str().to_string(), record.clone());
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, InfrastructureError> {
        let removed = self.entries.write().await.remove(key.as_str()).is_some();
        if removed {
            debug!("Invalidated cached record '{}'", key);
        }
        Ok(removed)
    }
}
