//! # Infrastructure Layer
//!
//! Concrete collaborators for the session token service:
//!
//! - **Database**: MySQL token store using SQLx
//! - **Cache**: Redis client and the record cache built on it
//! - **Store**: cache-fronted decorator over any token store
//!
//! [`initialize`] wires them together from an [`AppConfig`].

use st_core::errors::DomainError;
use st_core::services::token::TokenLifecycleService;
use st_shared::config::{AppConfig, CacheType};
use st_shared::utils::mask_url;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// Cache module - Redis client and record caches
pub mod cache;

/// Store module - cache-fronted token store
pub mod store;

use cache::{MemoryRecordCache, RecordCache, RedisClient, RedisRecordCache};
use database::{DatabasePool, MySqlTokenStore};
use store::CachedTokenStore;

/// Token store as assembled by [`initialize`]: MySQL behind the configured
/// record cache
pub type ConfiguredTokenStore = CachedTokenStore<MySqlTokenStore, Box<dyn RecordCache>>;

/// Infrastructure service container
pub struct InfrastructureServices {
    /// Database pool, kept for health checks and shutdown
    pub database: DatabasePool,
    /// Redis client, absent when the in-process cache is configured
    pub redis: Option<RedisClient>,
    /// Lifecycle service over the cache-fronted MySQL store
    pub tokens: TokenLifecycleService<ConfiguredTokenStore>,
}

impl InfrastructureServices {
    /// Check database and, if configured, Redis connectivity
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        let database = self.database.health_check().await?;
        tracing::debug!("{}", self.database.get_statistics());
        let cache = match &self.redis {
            Some(client) => client.health_check().await?,
            None => true,
        };
        Ok(database && cache)
    }

    /// Close pooled connections
    pub async fn shutdown(&self) {
        self.database.close().await;
    }
}

/// Initialize infrastructure services
///
/// This function sets up:
/// - Database connection pool and the `user_token` table
/// - Redis connection (unless the memory cache is configured)
/// - The token lifecycle service over the cached store
pub async fn initialize(config: &AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!("Initializing infrastructure services...");

    let database = DatabasePool::new(config.database.clone()).await?;
    database.run_migrations().await?;

    let (redis, cache): (Option<RedisClient>, Box<dyn RecordCache>) = match config.cache.cache_type {
        CacheType::Redis => {
            tracing::info!("Using Redis record cache at {}", mask_url(&config.cache.url));
            let client = RedisClient::new(config.cache.clone()).await?;
            let cache = RedisRecordCache::new(client.clone(), &config.cache);
            (Some(client), Box::new(cache))
        }
        CacheType::Memory => {
            tracing::info!("Using in-process record cache");
            (None, Box::new(MemoryRecordCache::new()))
        }
    };

    let store = CachedTokenStore::new(MySqlTokenStore::new(database.get_pool().clone()), cache);
    let tokens = TokenLifecycleService::new(store, &config.token)?;

    tracing::info!("Infrastructure services initialized successfully");

    Ok(InfrastructureServices {
        database,
        redis,
        tokens,
    })
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Cached record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error raised by the domain layer during wiring
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Domain(inner) => inner,
            InfrastructureError::Config(message) => DomainError::Configuration { message },
            other => DomainError::Store {
                message: other.to_string(),
            },
        }
    }
}
