//! Shared utilities and common types for the session token service
//!
//! This crate provides functionality used across the workspace:
//! - Configuration types and loaders
//! - Configuration error type
//! - Tracing bootstrap
//! - Masking helpers for log output

pub mod config;
pub mod errors;
pub mod logging;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CacheType, DatabaseConfig, Environment, LogFormat, LoggingConfig,
    TokenConfig,
};
pub use errors::{ConfigError, ConfigResult};
pub use logging::init_tracing;
pub use utils::{mask_token, mask_url};
