//! Cache module
//!
//! Redis client with retry logic and the record caches that front the
//! token store.

pub mod record_cache;
pub mod redis_client;


pub use record_cache::{MemoryRecordCache, RecordCache, RedisRecordCache};
pub use redis_client::RedisClient;

// Re-export commonly used types
pub use st_shared::config::CacheConfig;
