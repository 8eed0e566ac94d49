//! Value objects representing immutable domain concepts.

pub mod validation;

pub use validation::{RefreshOutcome, ValidationOutcome, ValidationStatus};
