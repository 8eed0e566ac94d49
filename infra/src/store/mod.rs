//! Cache-fronted token store

pub mod cached_store;

#[cfg(test)]
mod tests;

pub use cached_store::CachedTokenStore;
