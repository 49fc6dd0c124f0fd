//! Session store
//!
//! The authoritative in-memory table of call sessions. Constructed once at
//! startup and shared by handle; every webhook reads and mutates it.

mod clock;
mod store;
mod types;

#[cfg(test)]
mod proptests;

pub use clock::Clock;
pub use store::{SessionStore, StatusUpdate, StoreError};
pub use types::*;
