//! Contact messages and the retention policy applied to them.
//!
//! A message is a flat record submitted through the public contact form.
//! Messages are short-lived by design: anything older than the retention
//! window is discarded the next time the collection is loaded.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Maximum age, in days, a message may reach before it is eligible for
/// removal.
pub const RETENTION_DAYS: i64 = 3;

/// The retention window as a [`Duration`].
pub fn retention_window() -> Duration {
  Duration::days(RETENTION_DAYS)
}

/// A persisted contact message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
  /// Unique, monotonically assigned by the store. Never reassigned.
  pub id:        i64,
  pub name:      String,
  pub email:     String,
  pub subject:   String,
  pub message:   String,
  /// Creation time, set by the store.
  pub timestamp: DateTime<Utc>,
  pub read:      bool,
}

/// Input for creating a message. `id`, `timestamp` and `read` are
/// assigned by the store. Fields missing from the wire deserialize as
/// empty strings so validation owns the rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMessage {
  pub name:    String,
  pub email:   String,
  pub subject: String,
  pub message: String,
}

/// A partial update. Absent fields are preserved; `id` and `timestamp`
/// are not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePatch {
  pub name:    Option<String>,
  pub email:   Option<String>,
  pub subject: Option<String>,
  pub message: Option<String>,
  pub read:    Option<bool>,
}

impl MessagePatch {
  /// True if the patch carries no fields at all.
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.email.is_none()
      && self.subject.is_none()
      && self.message.is_none()
      && self.read.is_none()
  }
}

impl ContactMessage {
  /// Shallow-merge `patch` into this message.
  pub fn apply(&mut self, patch: MessagePatch) {
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(email) = patch.email {
      self.email = email;
    }
    if let Some(subject) = patch.subject {
      self.subject = subject;
    }
    if let Some(message) = patch.message {
      self.message = message;
    }
    if let Some(read) = patch.read {
      self.read = read;
    }
  }

  /// True if the message has outlived the retention window as of `now`.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.timestamp < now - retention_window()
  }
}

/// Drop expired messages in place. Returns how many were removed.
pub fn prune(messages: &mut Vec<ContactMessage>, now: DateTime<Utc>) -> usize {
  let before = messages.len();
  messages.retain(|m| !m.is_expired(now));
  before - messages.len()
}
