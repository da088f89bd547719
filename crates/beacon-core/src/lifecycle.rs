//! The alert state machine — one explicit transition table, plus the
//! append-only audit record for every status change.
//!
//! Every legal edge is listed once and every mutation path (claim, advance,
//! cancel, admin override) consults the same table. The override bypasses
//! it by design and is recorded with its own [`ChangeOrigin`] so it stays
//! distinguishable in the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::AlertStatus;

// ─── Transition table ────────────────────────────────────────────────────────

/// The direct successors of `from` on the normal (actor-initiated) path.
///
/// | From       | To                    |
/// |------------|-----------------------|
/// | `active`   | `en_route`, `cancelled` |
/// | `en_route` | `on_scene`, `resolved`  |
/// | `on_scene` | `resolved`              |
pub fn successors(from: AlertStatus) -> &'static [AlertStatus] {
  use AlertStatus::*;
  match from {
    Active => &[EnRoute, Cancelled],
    EnRoute => &[OnScene, Resolved],
    OnScene => &[Resolved],
    Resolved | Cancelled => &[],
  }
}

/// Whether `from -> to` is a legal edge of the normal-path table.
pub fn permitted(from: AlertStatus, to: AlertStatus) -> bool {
  successors(from).contains(&to)
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

/// How a status change came about. Admin overrides bypass the transition
/// table and must remain observably distinct from actor-driven transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
  /// The first claim flipped `active -> en_route`.
  Claim,
  /// A responder or guardian advanced the alert along the table.
  Advance,
  /// The owner cancelled while the alert was still `active`.
  Cancel,
  /// Privileged operator correction, unconstrained by the table.
  AdminOverride,
}

/// One entry in an alert's append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  pub change_id:   Uuid,
  pub alert_id:    Uuid,
  pub from_status: AlertStatus,
  pub to_status:   AlertStatus,
  pub origin:      ChangeOrigin,
  /// The actor that triggered the change (owner, claimant, or admin).
  pub actor_id:    Uuid,
  pub recorded_at: DateTime<Utc>,
}
