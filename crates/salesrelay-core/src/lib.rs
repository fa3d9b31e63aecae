//! Core types and trait definitions for the salesrelay message store.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod message;
pub mod store;
