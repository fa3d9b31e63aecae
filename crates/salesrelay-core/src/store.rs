//! The `MessageStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `salesrelay-store-json`). The HTTP layer (`salesrelay-api`) depends on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use crate::message::{ContactMessage, MessagePatch, NewMessage};

/// Abstraction over a contact-message store backend.
///
/// Reads apply the retention policy before returning, so callers never
/// observe an expired message. Callers receive owned copies; the backend
/// exclusively owns the persisted representation.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MessageStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the full collection, pruned of expired messages.
  fn list(
    &self,
  ) -> impl Future<Output = Result<Vec<ContactMessage>, Self::Error>> + Send + '_;

  /// Persist a new message. The store assigns `id` (unique and
  /// monotonically increasing) and `timestamp`, and starts `read` at
  /// `false`.
  fn add(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<ContactMessage, Self::Error>> + Send + '_;

  /// Shallow-merge `patch` into the message with the given id and
  /// persist the result. Returns `None` if no such message exists.
  fn update(
    &self,
    id: i64,
    patch: MessagePatch,
  ) -> impl Future<Output = Result<Option<ContactMessage>, Self::Error>> + Send + '_;

  /// Remove the message with the given id. Returns `false` if nothing
  /// matched.
  fn delete(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
