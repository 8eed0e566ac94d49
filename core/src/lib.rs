//! # Session Token Core
//!
//! Domain layer of the session token service: the token record, the token
//! codec, the expiry policy, the lifecycle service and the record store
//! interface it runs against.

pub mod domain;
pub mod services;
pub mod repositories;
pub mod errors;

// Re-export commonly used types for convenience
pub use domain::{
    IssuedTokens, RefreshOutcome, TokenRecord, TokenRecordPatch,
    ValidationOutcome, ValidationStatus,
};
pub use errors::{DomainError, DomainResult};
pub use repositories::{CacheKey, InMemoryTokenStore, RecordFilter, TokenStore, CACHE_NAMESPACE};
pub use services::{
    Clock, ExpiryPolicy, ManualClock, SystemClock,
    TokenCodec, TokenLifecycleService,
};
