//! Decode errors and backend-error mapping for `beacon-store-sqlite`.
//!
//! The [`beacon_core::store::AlertStore`] trait speaks `beacon_core::Error`;
//! everything here is about folding this backend's native failures into
//! `Error::Storage` while the semantic variants (not-found, conflict,
//! invalid-state, duplicate) are produced directly by the store.

use thiserror::Error;

/// A stored value that could not be decoded back into a domain type.
/// Indicates a corrupt or hand-edited database file.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown status value: {0:?}")]
  UnknownStatus(String),

  #[error("unknown change origin: {0:?}")]
  UnknownOrigin(String),
}

impl From<DecodeError> for beacon_core::Error {
  fn from(e: DecodeError) -> Self { beacon_core::Error::storage(e) }
}

/// Fold a `tokio_rusqlite` failure into the core storage variant.
pub(crate) fn db_err(e: tokio_rusqlite::Error) -> beacon_core::Error {
  beacon_core::Error::storage(e)
}
