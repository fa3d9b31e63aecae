//! Error type for `salesrelay-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The store file exists but does not parse as a message collection.
  /// Deliberately distinct from the absent-file case, which is a normal
  /// first-run bootstrap and yields an empty collection.
  #[error("store file {path} is corrupt: {source}")]
  Corrupt {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("serialization error: {0}")]
  Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
