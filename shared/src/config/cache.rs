//! Cache configuration module

use serde::{Deserialize, Serialize};

/// Record cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Backend used to cache token records
    #[serde(default = "default_cache_type")]
    pub cache_type: CacheType,

    /// Redis connection URL
    pub url: String,

    /// Maximum retry attempts for a Redis operation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds (doubled per attempt)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// TTL for cached records in seconds.
    ///
    /// This only bounds how long a copy lives in the cache; token validity is
    /// always computed from the record's own timestamps.
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,

    /// Optional prefix prepended to every cache key
    #[serde(default)]
    pub key_prefix: Option<String>,
}

/// Cache type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    Redis,
    Memory,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            url: String::from("redis://localhost:6379"),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            default_ttl: default_ttl(),
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let cache_type = match std::env::var("CACHE_TYPE").as_deref() {
            Ok("memory") => CacheType::Memory,
            _ => CacheType::Redis,
        };
        let default_ttl = std::env::var("CACHE_DEFAULT_TTL")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_ttl);
        let key_prefix = std::env::var("CACHE_KEY_PREFIX").ok().filter(|p| !p.is_empty());

        Self {
            cache_type,
            url,
            default_ttl,
            key_prefix,
            ..Default::default()
        }
    }

    /// Create a new Redis cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Create an in-process cache configuration
    pub fn memory() -> Self {
        Self {
            cache_type: CacheType::Memory,
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the TTL for cached records
    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl = seconds;
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn default_cache_type() -> CacheType {
    CacheType::Redis
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_ttl() -> u64 {
    3600 // 1 hour
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.cache_type, CacheType::Redis);
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_cache_config_with_prefix() {
        let config = CacheConfig::new("redis://cache:6379")
            .with_prefix("sessions")
            .with_ttl(120);

        assert_eq!(config.make_key("user_token/42"), "sessions:user_token/42");
        assert_eq!(config.default_ttl, 120);
    }

    #[test]
    fn test_cache_key_without_prefix() {
        let config = CacheConfig::memory();
        assert_eq!(config.cache_type, CacheType::Memory);
        assert_eq!(config.make_key("user_token/42"), "user_token/42");
    }

    #[test]
    fn test_cache_type_deserialize() {
        let parsed: CacheType = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(parsed, CacheType::Memory);
    }
}
