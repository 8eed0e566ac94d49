//! Record store trait: the merged persistence and cache contract for
//! session token records.

use async_trait::async_trait;

use crate::domain::entities::{TokenRecord, TokenRecordPatch};
use crate::errors::DomainError;

/// Namespace of uid-keyed cache entries
pub const CACHE_NAMESPACE: &str = "user_token";

/// Key of the cached copy of a uid's record, `user_token/<uid>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_uid(uid: &str) -> Self {
        Self(format!("{}/{}", CACHE_NAMESPACE, uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Equality condition selecting a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    Uid(String),
    Token(String),
    RefreshToken(String),
}

impl RecordFilter {
    /// Column the filter compares against
    pub fn column(&self) -> &'static str {
        match self {
            RecordFilter::Uid(_) => "uid",
            RecordFilter::Token(_) => "token",
            RecordFilter::RefreshToken(_) => "refresh_token",
        }
    }

    /// Value the column must equal
    pub fn value(&self) -> &str {
        match self {
            RecordFilter::Uid(v) | RecordFilter::Token(v) | RecordFilter::RefreshToken(v) => v,
        }
    }

    /// Whether `record` satisfies the filter
    pub fn matches(&self, record: &TokenRecord) -> bool {
        match self {
            RecordFilter::Uid(uid) => &record.uid == uid,
            RecordFilter::Token(token) => record.token.as_deref() == Some(token.as_str()),
            RecordFilter::RefreshToken(refresh) => {
                record.refresh_token.as_deref() == Some(refresh.as_str())
            }
        }
    }
}

/// Store for [`TokenRecord`]s, optionally fronted by a cache.
///
/// Every method takes the cache key of the affected entry. Reads with
/// `None` bypass the cache and go to the backing store only; writes always
/// name the uid's key so the cached copy can be invalidated.
///
/// Errors returned here are infrastructure faults and must reach the caller
/// as such; "no matching record" is `Ok(None)`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch the single record matching `filter`
    ///
    /// # Returns
    /// * `Ok(Some(TokenRecord))` - Record found
    /// * `Ok(None)` - No record matches
    /// * `Err(DomainError)` - Store or cache failure
    async fn get_row(
        &self,
        filter: &RecordFilter,
        cache_key: Option<&CacheKey>,
    ) -> Result<Option<TokenRecord>, DomainError>;

    /// Insert a new record
    ///
    /// # Returns
    /// * `Ok(true)` - Record written
    /// * `Ok(false)` - The store refused the row (e.g. duplicate uid)
    async fn insert_row(
        &self,
        record: &TokenRecord,
        cache_key: &CacheKey,
    ) -> Result<bool, DomainError>;

    /// Apply `patch` to the record matching `filter`
    ///
    /// # Returns
    /// * `Ok(true)` - Record updated
    /// * `Ok(false)` - No record matched, or the patch was empty
    async fn update_row(
        &self,
        filter: &RecordFilter,
        patch: &TokenRecordPatch,
        cache_key: &CacheKey,
    ) -> Result<bool, DomainError>;

    /// Delete the record matching `filter`.
    ///
    /// Deleting a record that does not exist is not an error.
    ///
    /// # Returns
    /// * `Ok(true)` - A record was removed
    /// * `Ok(false)` - Nothing matched
    async fn delete_row(
        &self,
        filter: &RecordFilter,
        cache_key: &CacheKey,
    ) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_for_uid() {
        assert_eq!(CacheKey::for_uid("42").as_str(), "user_token/42");
        assert_eq!(CacheKey::for_uid("u1").to_string(), "user_token/u1");
    }

    #[test]
    fn test_filter_matches() {
        let record = TokenRecord::issued("u1", "tok", "ref", 0);

        assert!(RecordFilter::Uid("u1".into()).matches(&record));
        assert!(RecordFilter::Token("tok".into()).matches(&record));
        assert!(RecordFilter::RefreshToken("ref".into()).matches(&record));
        assert!(!RecordFilter::Token("ref".into()).matches(&record));
        assert_eq!(RecordFilter::RefreshToken("ref".into()).column(), "refresh_token");
    }
}
