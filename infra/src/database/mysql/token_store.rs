//! MySQL implementation of the TokenStore trait.
//!
//! Records live in the `user_token` table, one row per uid, with unique
//! indexes on both token columns so lookups by presented value are indexed.
//! Cache keys are ignored here; caching is layered on top by
//! [`CachedTokenStore`](crate::store::CachedTokenStore).

use async_trait::async_trait;
use sqlx::{mysql::MySqlRow, MySql, MySqlPool, QueryBuilder, Row};
use tracing::{debug, warn};

use st_core::domain::entities::{TokenRecord, TokenRecordPatch};
use st_core::errors::DomainError;
use st_core::repositories::{CacheKey, RecordFilter, TokenStore};

use crate::InfrastructureError;

const SELECT_COLUMNS: &str = "uid, token, token_time, refresh_token, refresh_token_time";

/// Width of the `uid` column in characters
pub const MAX_UID_CHARS: usize = 128;

/// MySQL implementation of TokenStore
#[derive(Clone)]
pub struct MySqlTokenStore {
    pool: MySqlPool,
}

impl MySqlTokenStore {
    /// Create a new MySQL token store
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a `user_token` row to a [`TokenRecord`]
    fn row_to_record(row: &MySqlRow) -> Result<TokenRecord, InfrastructureError> {
        Ok(TokenRecord {
            uid: row.try_get("uid")?,
            token: row.try_get("token")?,
            token_issued_at: row.try_get("token_time")?,
            refresh_token: row.try_get("refresh_token")?,
            refresh_token_issued_at: row.try_get("refresh_token_time")?,
        })
    }
}

/// `SELECT` for a single record matching `filter`
pub(crate) fn select_sql(filter: &RecordFilter) -> String {
    format!(
        "SELECT {} FROM user_token WHERE {} = ? LIMIT 1",
        SELECT_COLUMNS,
        filter.column()
    )
}

/// `UPDATE` setting only the fields present in `patch`.
///
/// The caller must reject empty patches; an empty `SET` list is not valid
/// SQL.
pub(crate) fn update_query<'a>(filter: &'a RecordFilter, patch: &'a TokenRecordPatch) -> QueryBuilder<'a, MySql> {
    let mut builder = QueryBuilder::<MySql>::new("UPDATE user_token SET ");

    let mut fields = builder.separated(", ");
    if let Some(token) = &patch.token {
        fields.push("token = ").push_bind_unseparated(token);
    }
    if let Some(issued_at) = patch.token_issued_at {
        fields.push("token_time = ").push_bind_unseparated(issued_at);
    }
    if let Some(refresh_token) = &patch.refresh_token {
        fields.push("refresh_token = ").push_bind_unseparated(refresh_token);
    }
    if let Some(issued_at) = patch.refresh_token_issued_at {
        fields.push("refresh_token_time = ").push_bind_unseparated(issued_at);
    }

    builder
        .push(" WHERE ")
        .push(filter.column())
        .push(" = ")
        .push_bind(filter.value());
    builder
}

/// Keep `record` only if it matches `filter` byte for byte, whatever the
/// column collation did
pub(crate) fn exact_match(filter: &RecordFilter, record: TokenRecord) -> Option<TokenRecord> {
    if filter.matches(&record) {
        Some(record)
    } else {
        warn!(column = filter.column(), "Discarded row matched only under column collation");
        None
    }
}

/// Whether `uid` fits the column without truncation
pub(crate) fn uid_fits(uid: &str) -> bool {
    uid.chars().count() <= MAX_UID_CHARS
}

/// A uid filter too wide for the column can match no row
fn unmatchable(filter: &RecordFilter) -> bool {
    matches!(filter, RecordFilter::Uid(uid) if !uid_fits(uid))
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl TokenStore for MySqlTokenStore {
    async fn get_row(
        &self,
        filter: &RecordFilter,
        _cache_key: Option<&CacheKey>,
    ) -> Result<Option<TokenRecord>, DomainError> {
        if unmatchable(filter) {
            return Ok(None);
        }

        let row = sqlx::query(&select_sql(filter))
            .bind(filter.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(InfrastructureError::from)?;

        match row {
            Some(row) => Ok(exact_match(filter, Self::row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_row(&self, record: &TokenRecord, _cache_key: &CacheKey) -> Result<bool, DomainError> {
        if !uid_fits(&record.uid) {
            return Err(DomainError::store(format!(
                "uid exceeds {} characters",
                MAX_UID_CHARS
            )));
        }

        let query = r#"
            INSERT INTO user_token (
                uid, token, token_time, refresh_token, refresh_token_time
            ) VALUES (?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(&record.uid)
            .bind(&record.token)
            .bind(record.token_issued_at)
            .bind(&record.refresh_token)
            .bind(record.refresh_token_issued_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if is_duplicate_key(&e) => {
                warn!(uid = %record.uid, "Token record insert hit an existing key");
                Ok(false)
            }
            Err(e) => Err(InfrastructureError::from(e).into()),
        }
    }

    async fn update_row(
        &self,
        filter: &RecordFilter,
        patch: &TokenRecordPatch,
        _cache_key: &CacheKey,
    ) -> Result<bool, DomainError> {
        if patch.is_empty() || unmatchable(filter) {
            return Ok(false);
        }

        let result = update_query(filter, patch)
            .build()
            .execute(&self.pool)
            .await
            .map_err(InfrastructureError::from)?;

        debug!(column = filter.column(), rows = result.rows_affected(), "Updated token record");
        Ok(result.rows_affected() > 0)
    }

    async fn delete_row(&self, filter: &RecordFilter, _cache_key: &CacheKey) -> Result<bool, DomainError> {
        if unmatchable(filter) {
            return Ok(false);
        }

        let sql = format!("DELETE FROM user_token WHERE {} = ?", filter.column());

        let result = sqlx::query(&sql)
            .bind(filter.value())
            .execute(&self.pool)
            .await
            .map_err(InfrastructureError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
