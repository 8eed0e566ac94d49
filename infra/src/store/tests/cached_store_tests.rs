//! Unit tests for the cache-fronted token store

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use st_core::domain::entities::{TokenRecord, TokenRecordPatch};
use st_core::errors::DomainError;
use st_core::repositories::{CacheKey, InMemoryTokenStore, RecordFilter, TokenStore};
use st_core::services::token::{ManualClock, TokenLifecycleService};
use st_core::ValidationStatus;
use st_shared::config::TokenConfig;

use crate::cache::{MemoryRecordCache, RecordCache};
use crate::store::CachedTokenStore;
use crate::InfrastructureError;

fn record(uid: &str, fill: char, at: i64) -> TokenRecord {
    TokenRecord::issued(uid, fill.to_string().repeat(128), fill.to_string().repeat(64), at)
}

fn cached() -> (CachedTokenStore<InMemoryTokenStore, MemoryRecordCache>, InMemoryTokenStore, MemoryRecordCache) {
    let inner = InMemoryTokenStore::new();
    let cache = MemoryRecordCache::new();
    (CachedTokenStore::new(inner.clone(), cache.clone()), inner, cache)
}

#[tokio::test]
async fn test_keyed_read_goes_through_cache() {
    let (store, inner, cache) = cached();
    let key = CacheKey::for_uid("u1");
    let filter = RecordFilter::Uid("u1".into());
    store.insert_row(&record("u1", 'a', 0), &key).await.unwrap();

    let first = store.get_row(&filter, Some(&key)).await.unwrap();
    assert!(first.is_some());
    assert_eq!(inner.reads(), 1);
    assert!(cache.contains(&key).await);

    let second = store.get_row(&filter, Some(&key)).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(inner.reads(), 1);
}

#[tokio::test]
async fn test_unkeyed_read_bypasses_cache() {
    let (store, inner, cache) = cached();
    let key = CacheKey::for_uid("u1");
    store.insert_row(&record("u1", 'a', 0), &key).await.unwrap();

    let filter = RecordFilter::Token("a".repeat(128));
    store.get_row(&filter, None).await.unwrap().unwrap();
    store.get_row(&filter, None).await.unwrap().unwrap();

    assert_eq!(inner.reads(), 2);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_miss_is_not_cached() {
    let (store, inner, cache) = cached();
    let key = CacheKey::for_uid("ghost");

    assert!(store.get_row(&RecordFilter::Uid("ghost".into()), Some(&key)).await.unwrap().is_none());
    assert!(store.get_row(&RecordFilter::Uid("ghost".into()), Some(&key)).await.unwrap().is_none());
    assert_eq!(inner.reads(), 2);
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_writes_invalidate_cached_copy() {
    let (store, _, cache) = cached();
    let key = CacheKey::for_uid("u1");
    let filter = RecordFilter::Uid("u1".into());

    store.insert_row(&record("u1", 'a', 0), &key).await.unwrap();
    store.get_row(&filter, Some(&key)).await.unwrap();
    assert!(cache.contains(&key).await);

    let patch = TokenRecordPatch::rotation("b".repeat(128), "b".repeat(64), 50);
    assert!(store.update_row(&filter, &patch, &key).await.unwrap());
    assert!(!cache.contains(&key).await);

    let fresh = store.get_row(&filter, Some(&key)).await.unwrap().unwrap();
    assert_eq!(fresh.token_issued_at, Some(50));

    assert!(store.delete_row(&filter, &key).await.unwrap());
    assert!(!cache.contains(&key).await);
    assert!(store.get_row(&filter, Some(&key)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_entry_not_matching_filter_is_refetched() {
    let (store, inner, cache) = cached();
    let key = CacheKey::for_uid("u1");

    // Cache holds a record for a different uid under this key
    cache.put(&key, &record("other", 'z', 0)).await.unwrap();
    inner.insert_row(&record("u1", 'a', 0), &key).await.unwrap();

    let found = store
        .get_row(&RecordFilter::Uid("u1".into()), Some(&key))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.uid, "u1");
    assert_eq!(cache.get(&key).await.unwrap().unwrap().uid, "u1");
}

#[tokio::test]
async fn test_lifecycle_over_cached_store() {
    let (store, _, cache) = cached();
    let clock = ManualClock::new(1_700_000_000);
    let config = TokenConfig::new("pub", "sec", 3600, 86400);
    let service = TokenLifecycleService::with_clock(store, &config, clock.clone()).unwrap();

    let t0 = service.issue_or_rotate("u1", "pw").await.unwrap().token;
    clock.advance(100);
    assert_eq!(service.validate_by_uid("u1", &t0).await.unwrap().status, ValidationStatus::Ok);
    assert!(cache.contains(&CacheKey::for_uid("u1")).await);

    // Rotation must not leave the old pair readable through the cache
    let t1 = service.issue_or_rotate("u1", "pw").await.unwrap().token;
    assert_eq!(service.validate_by_uid("u1", &t0).await.unwrap().status, ValidationStatus::NotFound);
    assert_eq!(service.validate_by_uid("u1", &t1).await.unwrap().status, ValidationStatus::Ok);

    service.revoke("u1").await.unwrap();
    assert_eq!(service.validate_by_uid("u1", &t1).await.unwrap().status, ValidationStatus::NotFound);
}

/// Store that, once armed, holds its next `get_row` result until released
#[derive(Clone, Default)]
struct SlowReadStore {
    inner: InMemoryTokenStore,
    armed: Arc<AtomicBool>,
    fetched: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl TokenStore for SlowReadStore {
    async fn get_row(&self, filter: &RecordFilter, key: Option<&CacheKey>) -> Result<Option<TokenRecord>, DomainError> {
        let found = self.inner.get_row(filter, key).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.fetched.notify_one();
            self.release.notified().await;
        }
        Ok(found)
    }

    async fn insert_row(&self, record: &TokenRecord, key: &CacheKey) -> Result<bool, DomainError> {
        self.inner.insert_row(record, key).await
    }

    async fn update_row(&self, filter: &RecordFilter, patch: &TokenRecordPatch, key: &CacheKey) -> Result<bool, DomainError> {
        self.inner.update_row(filter, patch, key).await
    }

    async fn delete_row(&self, filter: &RecordFilter, key: &CacheKey) -> Result<bool, DomainError> {
        self.inner.delete_row(filter, key).await
    }
}

/// Memory cache whose invalidations start failing after `allowed` calls
#[derive(Clone, Default)]
struct FlakyInvalidateCache {
    inner: MemoryRecordCache,
    allowed: Arc<AtomicUsize>,
}

impl FlakyInvalidateCache {
    fn allowing(allowed: usize) -> Self {
        Self {
            inner: MemoryRecordCache::new(),
            allowed: Arc::new(AtomicUsize::new(allowed)),
        }
    }
}

#[async_trait]
impl RecordCache for FlakyInvalidateCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<TokenRecord>, InfrastructureError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &CacheKey, record: &TokenRecord) -> Result<(), InfrastructureError> {
        self.inner.put(key, record).await
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, InfrastructureError> {
        let left = self.allowed.load(Ordering::SeqCst);
        if left == 0 {
            return Err(InfrastructureError::Cache(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection reset",
            ))));
        }
        self.allowed.store(left - 1, Ordering::SeqCst);
        self.inner.invalidate(key).await
    }
}

#[tokio::test]
async fn test_delete_during_slow_fill_leaves_no_stale_entry() {
    let slow = SlowReadStore::default();
    let cache = MemoryRecordCache::new();
    let store = Arc::new(CachedTokenStore::new(slow.clone(), cache.clone()));
    let key = CacheKey::for_uid("u1");
    let filter = RecordFilter::Uid("u1".into());
    store.insert_row(&record("u1", 'a', 1), &key).await.unwrap();

    slow.armed.store(true, Ordering::SeqCst);
    let reader = {
        let store = store.clone();
        let (filter, key) = (filter.clone(), key.clone());
        tokio::spawn(async move { store.get_row(&filter, Some(&key)).await })
    };
    slow.fetched.notified().await;

    // Revoke while the reader holds a copy it has not cached yet
    let deleter = {
        let store = store.clone();
        let (filter, key) = (filter.clone(), key.clone());
        tokio::spawn(async move { store.delete_row(&filter, &key).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    slow.release.notify_one();

    reader.await.unwrap().unwrap();
    assert!(deleter.await.unwrap().unwrap());

    assert!(!cache.contains(&key).await);
    assert!(store.get_row(&filter, Some(&key)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoke_during_slow_validation_is_final() {
    let slow = SlowReadStore::default();
    let store = CachedTokenStore::new(slow.clone(), MemoryRecordCache::new());
    let config = TokenConfig::new("pub", "sec", 3600, 86400);
    let service = Arc::new(TokenLifecycleService::with_clock(store, &config, ManualClock::new(1_700_000_000)).unwrap());

    let token = service.issue_or_rotate("u1", "pw").await.unwrap().token;

    slow.armed.store(true, Ordering::SeqCst);
    let validation = {
        let (service, token) = (service.clone(), token.clone());
        tokio::spawn(async move { service.validate_by_uid("u1", &token).await })
    };
    slow.fetched.notified().await;

    let revoke = {
        let service = service.clone();
        tokio::spawn(async move { service.revoke("u1").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    slow.release.notify_one();

    validation.await.unwrap().unwrap();
    revoke.await.unwrap().unwrap();

    assert!(slow.inner.is_empty().await);
    let after = service.validate_by_uid("u1", &token).await.unwrap();
    assert_eq!(after.status, ValidationStatus::NotFound);
}

#[tokio::test]
async fn test_failed_invalidation_aborts_write() {
    let inner = InMemoryTokenStore::new();
    let cache = FlakyInvalidateCache::allowing(2);
    let store = CachedTokenStore::new(inner.clone(), cache.clone());
    let key = CacheKey::for_uid("u1");
    let filter = RecordFilter::Uid("u1".into());

    store.insert_row(&record("u1", 'a', 1), &key).await.unwrap();
    store.get_row(&filter, Some(&key)).await.unwrap();

    let patch = TokenRecordPatch::rotation("b".repeat(128), "b".repeat(64), 50);
    let result = store.update_row(&filter, &patch, &key).await;
    assert!(matches!(result, Err(DomainError::Store { .. })));

    // Nothing was written and the cached copy still matches the store
    let stored = inner.get_row(&filter, None).await.unwrap().unwrap();
    assert_eq!(stored.token_issued_at, Some(1));
    assert_eq!(cache.get(&key).await.unwrap(), Some(stored));
}

#[tokio::test]
async fn test_failed_final_invalidation_leaves_key_empty() {
    let inner = InMemoryTokenStore::new();
    let cache = FlakyInvalidateCache::allowing(3);
    let store = CachedTokenStore::new(inner.clone(), cache.clone());
    let key = CacheKey::for_uid("u1");
    let filter = RecordFilter::Uid("u1".into());

    store.insert_row(&record("u1", 'a', 1), &key).await.unwrap();
    store.get_row(&filter, Some(&key)).await.unwrap();

    let patch = TokenRecordPatch::rotation("b".repeat(128), "b".repeat(64), 50);
    let result = store.update_row(&filter, &patch, &key).await;
    assert!(matches!(result, Err(DomainError::Store { .. })));

    // The write landed; the old copy was cleared before it
    assert!(cache.get(&key).await.unwrap().is_none());
    let fresh = store.get_row(&filter, Some(&key)).await.unwrap().unwrap();
    assert_eq!(fresh.token_issued_at, Some(50));
}
