//! Unit tests for domain error types

use st_shared::errors::ConfigError;

use super::DomainError;

#[test]
fn test_config_error_conversion() {
    let err: DomainError = ConfigError::missing("TOKEN_SECRET_KEY").into();
    assert!(matches!(err, DomainError::Configuration { .. }));
    assert_eq!(err.code(), "CONFIGURATION_ERROR");
    assert!(err.to_string().contains("TOKEN_SECRET_KEY"));
}

#[test]
fn test_store_error_code() {
    let err = DomainError::store("connection refused");
    assert_eq!(err.code(), "STORE_ERROR");
    assert_eq!(err.to_string(), "Store error: connection refused");
}
