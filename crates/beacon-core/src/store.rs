//! The `AlertStore` trait and supporting write types.
//!
//! The trait is implemented by storage backends (e.g. `beacon-store-sqlite`).
//! Higher layers (engine, tracker, API) depend on this abstraction, not on
//! any concrete backend.
//!
//! No in-process lock is held across operations; every ordering guarantee
//! the engine relies on comes from this trait's atomic primitives:
//! the partial-uniqueness of open alerts per owner (`create_alert`), the
//! compare-and-swap on status (`update_status`), the add-to-set-and-flip
//! claim (`claim`), and the serialised append (`append_location`).
//!
//! All methods return [`crate::Error`] so the engine can branch on
//! conflict/not-found semantics; backends wrap their native failures in
//! [`crate::Error::Storage`].

use std::future::Future;

use uuid::Uuid;

use crate::{
  alert::{Alert, AlertStatus, NewAlert, NewLocationSample},
  lifecycle::{ChangeOrigin, StatusChange},
  Result,
};

// ─── Write types ─────────────────────────────────────────────────────────────

/// A guarded status write. When `expected` is set the write only lands if
/// the persisted status still matches; otherwise it fails with
/// [`crate::Error::StatusConflict`] and performs no mutation.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
  /// CAS precondition on the persisted status.
  pub expected: Option<AlertStatus>,
  pub to:       AlertStatus,
  /// Replaces the resolution note when supplied.
  pub notes:    Option<String>,
  /// Recorded in the audit trail; admin overrides stay distinguishable.
  pub origin:   ChangeOrigin,
  pub actor_id: Uuid,
}

/// Result of a [`AlertStore::claim`] call.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
  /// The alert after the claim was applied.
  pub alert:        Alert,
  /// Whether the actor was added to the responding set by this call
  /// (`false` on a repeat claim by the same actor).
  pub newly_joined: bool,
  /// Whether this call performed the `active -> en_route` flip.
  pub transitioned: bool,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an alert storage backend.
///
/// Alerts are never deleted. `location_history` and the status audit trail
/// are append-only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AlertStore: Send + Sync {
  /// Persist a new alert in `active` status with one initial location
  /// sample.
  ///
  /// Enforces the one-open-alert-per-owner invariant atomically: if the
  /// owner already has a non-terminal alert — even one created by a racing
  /// request — fails with [`crate::Error::DuplicateActive`] carrying the
  /// existing alert.
  fn create_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<Alert>> + Send + '_;

  /// Retrieve an alert by id. Returns `None` if not found.
  fn get_alert(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>>> + Send + '_;

  /// The owner's current non-terminal alert, if any. The invariant
  /// guarantees at most one.
  fn find_active_by_owner(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Option<Alert>>> + Send + '_;

  /// All alerts ever raised by `owner`, newest first.
  fn find_by_owner(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Alert>>> + Send + '_;

  /// All alerts whose status is one of `statuses`, newest first.
  fn find_by_status<'a>(
    &'a self,
    statuses: &'a [AlertStatus],
  ) -> impl Future<Output = Result<Vec<Alert>>> + Send + 'a;

  /// All alerts `actor` is (or was) engaged on, newest first.
  fn find_by_responder(
    &self,
    actor: Uuid,
  ) -> impl Future<Output = Result<Vec<Alert>>> + Send + '_;

  /// Apply a guarded status write and append the audit record in the same
  /// transaction.
  ///
  /// Entering a terminal state sets `resolved_at`; leaving one (admin
  /// override re-open) clears it.
  fn update_status(
    &self,
    id: Uuid,
    update: StatusUpdate,
  ) -> impl Future<Output = Result<Alert>> + Send + '_;

  /// Atomically add `actor` to the responding set and, if the persisted
  /// status is still `active`, flip it to `en_route` — all in one
  /// transaction, so under N concurrent claims the set gains exactly N
  /// members and the flip fires at most once.
  ///
  /// Fails with [`crate::Error::InvalidState`] on a terminal alert.
  fn claim(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<ClaimOutcome>> + Send + '_;

  /// Append one location sample and set the canonical position to its
  /// coordinates, in one transaction. Samples are ordered by server
  /// receipt; every accepted call grows the history by exactly one entry.
  ///
  /// Fails with [`crate::Error::InvalidState`] unless the alert is open.
  fn append_location(
    &self,
    id: Uuid,
    sample: NewLocationSample,
  ) -> impl Future<Output = Result<Alert>> + Send + '_;

  /// Replace the free-text description.
  fn set_description(
    &self,
    id: Uuid,
    description: String,
  ) -> impl Future<Output = Result<Alert>> + Send + '_;

  /// Latch `contacts_notified` to `true`. Never cleared afterwards.
  fn mark_contacts_notified(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// The alert's status audit trail in receipt order.
  fn status_history(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<StatusChange>>> + Send + '_;
}
