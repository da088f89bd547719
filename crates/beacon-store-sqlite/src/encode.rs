//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Statuses and change
//! origins are stored as their snake_case discriminants. UUIDs are stored
//! as hyphenated lowercase strings.

use std::{collections::BTreeSet, str::FromStr as _};

use beacon_core::{
  alert::{Alert, AlertStatus, GeoPoint, LocationSample},
  lifecycle::{ChangeOrigin, StatusChange},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DecodeError;

type Result<T> = std::result::Result<T, DecodeError>;

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| DecodeError::DateParse(e.to_string()))
}

// ─── AlertStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: AlertStatus) -> String { s.to_string() }

pub fn decode_status(s: &str) -> Result<AlertStatus> {
  AlertStatus::from_str(s)
    .map_err(|_| DecodeError::UnknownStatus(s.to_string()))
}

// ─── ChangeOrigin ────────────────────────────────────────────────────────────

pub fn encode_origin(o: ChangeOrigin) -> &'static str {
  match o {
    ChangeOrigin::Claim => "claim",
    ChangeOrigin::Advance => "advance",
    ChangeOrigin::Cancel => "cancel",
    ChangeOrigin::AdminOverride => "admin_override",
  }
}

pub fn decode_origin(s: &str) -> Result<ChangeOrigin> {
  match s {
    "claim" => Ok(ChangeOrigin::Claim),
    "advance" => Ok(ChangeOrigin::Advance),
    "cancel" => Ok(ChangeOrigin::Cancel),
    "admin_override" => Ok(ChangeOrigin::AdminOverride),
    other => Err(DecodeError::UnknownOrigin(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `alerts` row.
pub struct RawAlert {
  pub alert_id:          String,
  pub owner_id:          String,
  pub status:            String,
  pub canonical_lat:     f64,
  pub canonical_lng:     f64,
  pub contacts_notified: bool,
  pub description:       Option<String>,
  pub notes:             Option<String>,
  pub created_at:        String,
  pub resolved_at:       Option<String>,
}

/// Raw values read from a `location_samples` row.
pub struct RawSample {
  pub seq:         i64,
  pub latitude:    f64,
  pub longitude:   f64,
  pub accuracy:    Option<f64>,
  pub captured_at: Option<String>,
  pub recorded_at: String,
}

impl RawSample {
  pub fn into_sample(self) -> Result<LocationSample> {
    Ok(LocationSample {
      seq:         self.seq as u64,
      coordinates: GeoPoint {
        latitude:  self.latitude,
        longitude: self.longitude,
      },
      accuracy:    self.accuracy,
      captured_at: self.captured_at.as_deref().map(decode_dt).transpose()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// An alert row together with its samples (receipt order) and responding
/// set, as read inside one connection call.
pub struct RawAlertBundle {
  pub alert:      RawAlert,
  pub samples:    Vec<RawSample>,
  pub responders: Vec<String>,
}

impl RawAlertBundle {
  pub fn into_alert(self) -> Result<Alert> {
    let location_history: Vec<LocationSample> = self
      .samples
      .into_iter()
      .map(RawSample::into_sample)
      .collect::<Result<_>>()?;

    let responding_actors: BTreeSet<Uuid> = self
      .responders
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<_>>()?;

    Ok(Alert {
      alert_id:           decode_uuid(&self.alert.alert_id)?,
      owner_id:           decode_uuid(&self.alert.owner_id)?,
      status:             decode_status(&self.alert.status)?,
      canonical_location: GeoPoint {
        latitude:  self.alert.canonical_lat,
        longitude: self.alert.canonical_lng,
      },
      location_history,
      responding_actors,
      contacts_notified:  self.alert.contacts_notified,
      description:        self.alert.description,
      notes:              self.alert.notes,
      created_at:         decode_dt(&self.alert.created_at)?,
      resolved_at:        self
        .alert
        .resolved_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read from a `status_changes` row.
pub struct RawStatusChange {
  pub change_id:   String,
  pub alert_id:    String,
  pub from_status: String,
  pub to_status:   String,
  pub origin:      String,
  pub actor_id:    String,
  pub recorded_at: String,
}

impl RawStatusChange {
  pub fn into_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      change_id:   decode_uuid(&self.change_id)?,
      alert_id:    decode_uuid(&self.alert_id)?,
      from_status: decode_status(&self.from_status)?,
      to_status:   decode_status(&self.to_status)?,
      origin:      decode_origin(&self.origin)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}
