//! [`JsonStore`] — the flat-file implementation of [`MessageStore`].

use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;

use salesrelay_core::{
  message::{ContactMessage, MessagePatch, NewMessage, prune},
  store::MessageStore,
};

use crate::{Error, Result};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A message store backed by a single JSON file.
///
/// Cloning is cheap — clones share the path and the write lock. The lock
/// is held across each full load→mutate→save sequence, so the file never
/// sees interleaved writers from this process.
#[derive(Clone)]
pub struct JsonStore {
  path: Arc<PathBuf>,
  lock: Arc<Mutex<()>>,
}

impl JsonStore {
  /// Open a store at `path`, creating parent directories as needed.
  ///
  /// The file itself is not created until the first write; an absent file
  /// reads as an empty collection. An existing file is parsed eagerly so
  /// corruption surfaces at startup rather than on the first request.
  pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await.map_err(|source| {
        Error::Io { path: parent.to_path_buf(), source }
      })?;
    }

    let store = Self {
      path: Arc::new(path),
      lock: Arc::new(Mutex::new(())),
    };
    store.read_file().await?;
    Ok(store)
  }

  /// Read and parse the backing file without pruning.
  ///
  /// Absent file → empty collection. Unreadable or unparseable file → an
  /// error; corruption is never silently treated as empty.
  async fn read_file(&self) -> Result<Vec<ContactMessage>> {
    let raw = match tokio::fs::read(self.path.as_ref()).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(source) => {
        return Err(Error::Io { path: self.path.as_ref().clone(), source });
      }
    };

    serde_json::from_slice(&raw)
      .map_err(|source| Error::Corrupt { path: self.path.as_ref().clone(), source })
  }

  /// Load the collection and apply the retention policy. If pruning
  /// removed anything, the pruned collection is persisted immediately so
  /// stale entries are not re-evaluated on every read.
  ///
  /// Callers must hold the write lock.
  async fn load(&self) -> Result<Vec<ContactMessage>> {
    let mut messages = self.read_file().await?;

    let removed = prune(&mut messages, Utc::now());
    if removed > 0 {
      tracing::debug!(removed, remaining = messages.len(), "pruned expired messages");
      self.save(&messages).await?;
    }

    Ok(messages)
  }

  /// Atomically overwrite the backing file with `messages`,
  /// pretty-printed. Writes to a sibling temp file and renames it over
  /// the target, so readers never observe a partial write.
  ///
  /// Callers must hold the write lock.
  async fn save(&self, messages: &[ContactMessage]) -> Result<()> {
    let body = serde_json::to_vec_pretty(messages)?;

    let mut tmp = self.path.as_ref().as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &body)
      .await
      .map_err(|source| Error::Io { path: tmp.clone(), source })?;
    tokio::fs::rename(&tmp, self.path.as_ref())
      .await
      .map_err(|source| Error::Io { path: self.path.as_ref().clone(), source })?;

    Ok(())
  }

  /// Next message id: wall-clock milliseconds, bumped past the current
  /// maximum so ids stay unique and monotonic even when two messages
  /// arrive within the same millisecond.
  fn next_id(messages: &[ContactMessage]) -> i64 {
    let max_id = messages.iter().map(|m| m.id).max().unwrap_or(0);
    Utc::now().timestamp_millis().max(max_id + 1)
  }
}

// ─── MessageStore impl ───────────────────────────────────────────────────────

impl MessageStore for JsonStore {
  type Error = Error;

  async fn list(&self) -> Result<Vec<ContactMessage>> {
    let _guard = self.lock.lock().await;
    self.load().await
  }

  async fn add(&self, input: NewMessage) -> Result<ContactMessage> {
    let _guard = self.lock.lock().await;
    let mut messages = self.load().await?;

    let message = ContactMessage {
      id:        Self::next_id(&messages),
      name:      input.name,
      email:     input.email,
      subject:   input.subject,
      message:   input.message,
      timestamp: Utc::now(),
      read:      false,
    };

    messages.push(message.clone());
    self.save(&messages).await?;
    Ok(message)
  }

  async fn update(
    &self,
    id: i64,
    patch: MessagePatch,
  ) -> Result<Option<ContactMessage>> {
    let _guard = self.lock.lock().await;
    let mut messages = self.load().await?;

    let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
      return Ok(None);
    };

    // Nothing to merge; skip the rewrite.
    if patch.is_empty() {
      return Ok(Some(message.clone()));
    }

    message.apply(patch);
    let updated = message.clone();
    self.save(&messages).await?;
    Ok(Some(updated))
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    let _guard = self.lock.lock().await;
    let mut messages = self.load().await?;

    let before = messages.len();
    messages.retain(|m| m.id != id);
    if messages.len() == before {
      return Ok(false);
    }

    self.save(&messages).await?;
    Ok(true)
  }
}
