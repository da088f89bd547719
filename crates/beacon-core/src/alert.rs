//! Alert — the single shared mutable entity of the system.
//!
//! One alert is one emergency incident raised by an ordinary user. Alerts
//! are never deleted; terminal states are retained for history and audit.
//! All contention between concurrent writers funnels through the store's
//! per-record atomic update primitives.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The lifecycle state of an alert. `Active` is initial; `Resolved` and
/// `Cancelled` are terminal. Legal edges live in [`crate::lifecycle`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
  Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertStatus {
  Active,
  EnRoute,
  OnScene,
  Resolved,
  Cancelled,
}

impl AlertStatus {
  /// Terminal states accept no further actor-driven mutation.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Resolved | Self::Cancelled)
  }

  /// An open alert still accepts claims, advances, and location samples.
  pub fn is_open(self) -> bool { !self.is_terminal() }

  /// The non-terminal states, in lifecycle order. Used for "current alert"
  /// queries and the one-open-alert-per-owner invariant.
  pub const OPEN: [AlertStatus; 3] =
    [Self::Active, Self::EnRoute, Self::OnScene];

  /// The terminal states.
  pub const CLOSED: [AlertStatus; 2] = [Self::Resolved, Self::Cancelled];
}

// ─── Geometry ────────────────────────────────────────────────────────────────

/// A WGS 84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

impl GeoPoint {
  /// Reject coordinates outside the valid WGS 84 ranges.
  pub fn validate(&self) -> Result<()> {
    if !(-90.0..=90.0).contains(&self.latitude) {
      return Err(Error::Validation(format!(
        "latitude {} out of range [-90, 90]",
        self.latitude
      )));
    }
    if !(-180.0..=180.0).contains(&self.longitude) {
      return Err(Error::Validation(format!(
        "longitude {} out of range [-180, 180]",
        self.longitude
      )));
    }
    Ok(())
  }
}

// ─── Location samples ────────────────────────────────────────────────────────

/// One position reading in an alert's append-only history.
///
/// Samples are ordered by server receipt (`seq`), not by the client-supplied
/// `captured_at`; the canonical position is always the most recently appended
/// sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
  /// Per-alert receipt sequence number, assigned by the store.
  pub seq:         u64,
  pub coordinates: GeoPoint,
  /// Reported horizontal accuracy in metres, if the device supplied one.
  pub accuracy:    Option<f64>,
  /// Client-reported capture time. Retained verbatim; never used for
  /// ordering.
  pub captured_at: Option<DateTime<Utc>>,
  /// Server receipt time.
  pub recorded_at: DateTime<Utc>,
}

/// Input to a location append. `seq` and `recorded_at` are assigned by the
/// store; they are not accepted from callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocationSample {
  pub coordinates: GeoPoint,
  pub accuracy:    Option<f64>,
  pub captured_at: Option<DateTime<Utc>>,
}

impl NewLocationSample {
  pub fn validate(&self) -> Result<()> {
    self.coordinates.validate()?;
    if let Some(acc) = self.accuracy
      && !(acc >= 0.0)
    {
      return Err(Error::Validation(format!(
        "accuracy {acc} must be a non-negative number"
      )));
    }
    Ok(())
  }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// One emergency incident. Mutated exclusively through the lifecycle engine
/// and the location tracker; `alert_id` and `owner_id` are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
  pub alert_id:           Uuid,
  pub owner_id:           Uuid,
  pub status:             AlertStatus,
  /// Latest known position — the coordinates of the most recently appended
  /// location sample.
  pub canonical_location: GeoPoint,
  /// Append-only; insertion order is meaningful and never mutated.
  pub location_history:   Vec<LocationSample>,
  /// Actors currently engaged. A set: duplicate claims never add entries.
  pub responding_actors:  BTreeSet<Uuid>,
  /// Latched to `true` at most once, before any out-of-band send is
  /// attempted. Never cleared on send failure.
  pub contacts_notified:  bool,
  pub description:        Option<String>,
  /// Free-text resolution note.
  pub notes:              Option<String>,
  pub created_at:         DateTime<Utc>,
  /// Set on transition into a terminal state; cleared only when an admin
  /// override re-opens the alert.
  pub resolved_at:        Option<DateTime<Utc>>,
}

/// Input to [`crate::store::AlertStore::create_alert`].
/// `alert_id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub owner_id:    Uuid,
  pub location:    GeoPoint,
  pub description: Option<String>,
}
