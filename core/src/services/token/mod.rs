//! Session token module
//!
//! - `codec` derives opaque token pairs from identity, secrets and time
//! - `expiry` evaluates validity windows at read time
//! - `clock` abstracts the time source
//! - `service` ties them to the record store

mod clock;
pub mod codec;
pub mod expiry;
mod service;


pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{TokenCodec, TokenInput};
pub use expiry::{is_expired, ExpiryPolicy};
pub use service::TokenLifecycleService;
