//! Error taxonomy for `beacon-core`.
//!
//! Every fallible operation across the crate — store, guard, engine, tracker
//! — speaks this one enum, so callers can branch on conflict/not-found
//! semantics without knowing which backend produced them.

use thiserror::Error;
use uuid::Uuid;

use crate::{alert::Alert, alert::AlertStatus, guard::AlertAction};

#[derive(Debug, Error)]
pub enum Error {
  #[error("alert not found: {0}")]
  AlertNotFound(Uuid),

  /// The owner has no alert in a cancellable (`active`) state. Deliberately
  /// indistinguishable from "no alert at all" — cancellation is unavailable
  /// once a responder is en route.
  #[error("no cancellable alert for owner {0}")]
  NoCancellableAlert(Uuid),

  /// The owner already has an open (non-terminal) alert. Carries the
  /// existing alert so callers can return it for reference.
  #[error("owner {owner} already has an open alert {}", existing.alert_id)]
  DuplicateActive { owner: Uuid, existing: Box<Alert> },

  #[error("actor {actor} is not permitted to {action}")]
  Forbidden { actor: Uuid, action: AlertAction },

  /// The requested transition is not an edge of the lifecycle table.
  #[error("invalid transition: {from} -> {to}")]
  InvalidTransition { from: AlertStatus, to: AlertStatus },

  /// The alert is in a state that no longer accepts this operation
  /// (e.g. location updates on a resolved alert).
  #[error("alert {id} is {status} and no longer accepts updates")]
  InvalidState { id: Uuid, status: AlertStatus },

  /// A compare-and-swap on `status` lost a race with a concurrent writer.
  /// Safe to retry after re-reading the current state.
  #[error("alert {id} changed concurrently; status is now {actual}")]
  StatusConflict { id: Uuid, actual: AlertStatus },

  #[error("validation: {0}")]
  Validation(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure. Used by store implementations for anything that
  /// is not one of the semantic variants above.
  pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
