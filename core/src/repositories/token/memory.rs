//! In-process implementation of [`TokenStore`], used for tests, demos and
//! single-node deployments without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{TokenRecord, TokenRecordPatch};
use crate::errors::DomainError;

use super::r#trait::{CacheKey, RecordFilter, TokenStore};

/// Token records held in a map keyed by uid.
///
/// This is a backing store, not a cache: cache keys are accepted and
/// ignored. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    records: Arc<RwLock<HashMap<String, TokenRecord>>>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of `get_row` calls served so far
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_row(
        &self,
        filter: &RecordFilter,
        _cache_key: Option<&CacheKey>,
    ) -> Result<Option<TokenRecord>, DomainError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;

        let found = match filter {
            RecordFilter::Uid(uid) => records.get(uid).cloned(),
            _ => records.values().find(|r| filter.matches(r)).cloned(),
        };
        Ok(found)
    }

    async fn insert_row(
        &self,
        record: &TokenRecord,
        _cache_key: &CacheKey,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.uid) {
            return Ok(false);
        }

        records.insert(record.uid.clone(), record.clone());
        Ok(true)
    }

    async fn update_row(
        &self,
        filter: &RecordFilter,
        patch: &TokenRecordPatch,
        _cache_key: &CacheKey,
    ) -> Result<bool, DomainError> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut records = self.records.write().await;
        match records.values_mut().find(|r| filter.matches(r)) {
            Some(record) => {
                record.apply(patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_row(
        &self,
        filter: &RecordFilter,
        _cache_key: &CacheKey,
    ) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        let before = records.len();

        records.retain(|_, r| !filter.matches(r));

        Ok(records.len() < before)
    }
}
