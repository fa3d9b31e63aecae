//! JSON-file backend for the salesrelay message store.
//!
//! Persists the whole collection as one pretty-printed JSON array and
//! serialises every read-modify-write sequence behind an async mutex, so
//! concurrent handlers cannot lose each other's writes.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;
