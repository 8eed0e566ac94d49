//! Configuration module with sub-modules per concern:
//! - `token` - key material and validity windows for session tokens
//! - `cache` - record cache backend and Redis settings
//! - `database` - MySQL connection pool settings
//! - `environment` - environment detection and logging configuration

pub mod cache;
pub mod database;
pub mod environment;
pub mod token;

use config::{Config, ConfigBuilder, File, FileFormat};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigResult;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheType};
pub use database::DatabaseConfig;
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use token::TokenConfig;

/// Prefix of environment variables that override file values,
/// e.g. `ST__TOKEN__TOKEN_TTL_SECONDS=7200`
pub const ENV_PREFIX: &str = "ST";

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Token key material and TTLs (required, no defaults)
    pub token: TokenConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the current environment.
    ///
    /// Sources, lowest precedence first: the optional per-environment file
    /// (`config/<env>.toml`), then `ST__`-prefixed environment variables.
    /// A `.env` file is loaded into the process environment beforehand.
    pub fn load() -> ConfigResult<Self> {
        let environment = Environment::from_env();
        dotenvy::from_filename(environment.env_file()).ok();
        dotenvy::dotenv().ok();

        let builder = Config::builder()
            .add_source(File::with_name(environment.config_file()).required(false));
        let mut config = Self::build(builder)?;
        config.environment = environment;
        tracing::debug!(environment = %environment, "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a TOML document, still honoring environment
    /// overrides
    pub fn from_toml_str(toml: &str) -> ConfigResult<Self> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ConfigResult<Self> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.token.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigError;

    const SAMPLE: &str = r#"
        environment = "staging"

        [token]
        public_key = "pub"
        secret_key = "sec"
        token_ttl_seconds = 3600
        refresh_ttl_seconds = 604800

        [cache]
        cache_type = "memory"
        url = "redis://cache:6379"
        default_ttl = 600
    "#;

    #[test]
    fn test_load_from_toml() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.token.token_ttl_seconds, 3600);
        assert_eq!(config.token.refresh_ttl_seconds, 604800);
        assert_eq!(config.cache.cache_type, CacheType::Memory);
        assert_eq!(config.cache.default_ttl, 600);
        // Sections that are absent fall back to their defaults
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_token_section_is_fatal() {
        let result = AppConfig::from_toml_str("environment = \"development\"");
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_ttl_is_fatal() {
        let toml = r#"
            [token]
            public_key = "pub"
            secret_key = "sec"
            token_ttl_seconds = 0
            refresh_ttl_seconds = 60
        "#;
        let result = AppConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
