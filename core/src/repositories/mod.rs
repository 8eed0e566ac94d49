pub mod token;

pub use token::{CacheKey, InMemoryTokenStore, RecordFilter, TokenStore, CACHE_NAMESPACE};
