//! MySQL store implementations

pub mod token_store;

pub use token_store::MySqlTokenStore;
