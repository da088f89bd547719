//! [`SqliteStore`] — the SQLite implementation of [`AlertStore`].
//!
//! Every multi-step write runs inside one SQLite transaction on the single
//! store connection, which is what gives the engine its atomicity
//! guarantees: claims cannot lose set members or double-flip the status,
//! CAS updates either land against the expected status or touch nothing,
//! and location appends cannot interleave.

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use beacon_core::{
  Error, Result,
  alert::{Alert, AlertStatus, LocationSample, NewAlert, NewLocationSample},
  lifecycle::StatusChange,
  store::{AlertStore, ClaimOutcome, StatusUpdate},
};

use crate::{
  encode::{
    RawAlert, RawAlertBundle, RawSample, RawStatusChange, encode_dt,
    encode_origin, encode_status, encode_uuid,
  },
  error::db_err,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Beacon alert store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)
  }
}

// ─── Closure-side helpers ────────────────────────────────────────────────────

const ALERT_COLUMNS: &str = "alert_id, owner_id, status, canonical_lat, \
   canonical_lng, contacts_notified, description, notes, created_at, \
   resolved_at";

fn is_terminal_str(s: &str) -> bool { matches!(s, "resolved" | "cancelled") }

fn row_to_raw_alert(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAlert> {
  Ok(RawAlert {
    alert_id:          row.get(0)?,
    owner_id:          row.get(1)?,
    status:            row.get(2)?,
    canonical_lat:     row.get(3)?,
    canonical_lng:     row.get(4)?,
    contacts_notified: row.get(5)?,
    description:       row.get(6)?,
    notes:             row.get(7)?,
    created_at:        row.get(8)?,
    resolved_at:       row.get(9)?,
  })
}

fn read_samples(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Vec<RawSample>> {
  let mut stmt = conn.prepare(
    "SELECT seq, latitude, longitude, accuracy, captured_at, recorded_at
     FROM location_samples WHERE alert_id = ?1 ORDER BY seq",
  )?;
  stmt
    .query_map(rusqlite::params![id_str], |row| {
      Ok(RawSample {
        seq:         row.get(0)?,
        latitude:    row.get(1)?,
        longitude:   row.get(2)?,
        accuracy:    row.get(3)?,
        captured_at: row.get(4)?,
        recorded_at: row.get(5)?,
      })
    })?
    .collect()
}

fn read_responders(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare(
    "SELECT actor_id FROM alert_responders WHERE alert_id = ?1",
  )?;
  stmt
    .query_map(rusqlite::params![id_str], |row| row.get(0))?
    .collect()
}

fn attach_children(
  conn: &rusqlite::Connection,
  alert: RawAlert,
) -> rusqlite::Result<RawAlertBundle> {
  let samples = read_samples(conn, &alert.alert_id)?;
  let responders = read_responders(conn, &alert.alert_id)?;
  Ok(RawAlertBundle { alert, samples, responders })
}

fn read_bundle(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawAlertBundle>> {
  let raw = conn
    .query_row(
      &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE alert_id = ?1"),
      rusqlite::params![id_str],
      row_to_raw_alert,
    )
    .optional()?;
  raw.map(|a| attach_children(conn, a)).transpose()
}

/// Run `sql` (which must select [`ALERT_COLUMNS`]) and hydrate each row
/// with its samples and responding set.
fn read_bundles<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  sql: &str,
  params: P,
) -> rusqlite::Result<Vec<RawAlertBundle>> {
  let mut stmt = conn.prepare(sql)?;
  let alerts: Vec<RawAlert> = stmt
    .query_map(params, row_to_raw_alert)?
    .collect::<rusqlite::Result<_>>()?;
  alerts
    .into_iter()
    .map(|a| attach_children(conn, a))
    .collect()
}

fn read_open_by_owner(
  conn: &rusqlite::Connection,
  owner_str: &str,
) -> rusqlite::Result<Option<RawAlertBundle>> {
  let mut bundles = read_bundles(
    conn,
    &format!(
      "SELECT {ALERT_COLUMNS} FROM alerts
       WHERE owner_id = ?1 AND status IN ('active', 'en_route', 'on_scene')"
    ),
    rusqlite::params![owner_str],
  )?;
  Ok(bundles.pop())
}

// ─── Write outcomes ──────────────────────────────────────────────────────────

// Typed signals carried out of the connection closure so the async side can
// map them onto the core error taxonomy.

enum CreateWrite {
  Duplicate(RawAlertBundle),
  Done,
}

enum StatusWrite {
  NotFound,
  Conflict { actual: String },
  Done(RawAlertBundle),
}

enum ClaimWrite {
  NotFound,
  InvalidState { status: String },
  Done {
    bundle:       RawAlertBundle,
    newly_joined: bool,
    transitioned: bool,
  },
}

enum AppendWrite {
  NotFound,
  InvalidState { status: String },
  Done(RawAlertBundle),
}

// ─── AlertStore impl ─────────────────────────────────────────────────────────

impl AlertStore for SqliteStore {
  async fn create_alert(&self, input: NewAlert) -> Result<Alert> {
    let now = Utc::now();
    let alert = Alert {
      alert_id:           Uuid::new_v4(),
      owner_id:           input.owner_id,
      status:             AlertStatus::Active,
      canonical_location: input.location,
      location_history:   vec![LocationSample {
        seq:         1,
        coordinates: input.location,
        accuracy:    None,
        captured_at: None,
        recorded_at: now,
      }],
      responding_actors:  BTreeSet::new(),
      contacts_notified:  false,
      description:        input.description,
      notes:              None,
      created_at:         now,
      resolved_at:        None,
    };

    let id_str      = encode_uuid(alert.alert_id);
    let owner_str   = encode_uuid(alert.owner_id);
    let status_str  = encode_status(alert.status);
    let lat         = input.location.latitude;
    let lng         = input.location.longitude;
    let description = alert.description.clone();
    let now_str     = encode_dt(now);

    let outcome: CreateWrite = self
      .conn
      .call(move |conn| {
        // The open-per-owner check and the insert share one transaction;
        // the partial unique index backstops writers on other connections.
        let existing = {
          let tx = conn.transaction()?;
          if let Some(open) = read_open_by_owner(&tx, &owner_str)? {
            Some(open)
          } else {
            tx.execute(
              "INSERT INTO alerts (
                 alert_id, owner_id, status, canonical_lat, canonical_lng,
                 contacts_notified, description, notes, created_at,
                 resolved_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, NULL, ?7, NULL)",
              rusqlite::params![
                id_str, owner_str, status_str, lat, lng, description, now_str,
              ],
            )?;
            tx.execute(
              "INSERT INTO location_samples
                 (alert_id, seq, latitude, longitude, accuracy, captured_at,
                  recorded_at)
               VALUES (?1, 1, ?2, ?3, NULL, NULL, ?4)",
              rusqlite::params![id_str, lat, lng, now_str],
            )?;
            tx.commit()?;
            None
          }
        };

        Ok(match existing {
          Some(open) => CreateWrite::Duplicate(open),
          None => CreateWrite::Done,
        })
      })
      .await
      .map_err(db_err)?;

    match outcome {
      CreateWrite::Done => Ok(alert),
      CreateWrite::Duplicate(open) => Err(Error::DuplicateActive {
        owner:    input.owner_id,
        existing: Box::new(open.into_alert()?),
      }),
    }
  }

  async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>> {
    let id_str = encode_uuid(id);
    let bundle = self
      .conn
      .call(move |conn| Ok(read_bundle(conn, &id_str)?))
      .await
      .map_err(db_err)?;
    Ok(bundle.map(RawAlertBundle::into_alert).transpose()?)
  }

  async fn find_active_by_owner(&self, owner: Uuid) -> Result<Option<Alert>> {
    let owner_str = encode_uuid(owner);
    let bundle = self
      .conn
      .call(move |conn| Ok(read_open_by_owner(conn, &owner_str)?))
      .await
      .map_err(db_err)?;
    Ok(bundle.map(RawAlertBundle::into_alert).transpose()?)
  }

  async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<Alert>> {
    let owner_str = encode_uuid(owner);
    let bundles = self
      .conn
      .call(move |conn| {
        Ok(read_bundles(
          conn,
          &format!(
            "SELECT {ALERT_COLUMNS} FROM alerts
             WHERE owner_id = ?1 ORDER BY created_at DESC"
          ),
          rusqlite::params![owner_str],
        )?)
      })
      .await
      .map_err(db_err)?;
    decode_all(bundles)
  }

  async fn find_by_status(&self, statuses: &[AlertStatus]) -> Result<Vec<Alert>> {
    if statuses.is_empty() {
      return Ok(Vec::new());
    }
    let status_strs: Vec<String> =
      statuses.iter().map(|s| encode_status(*s)).collect();

    let bundles = self
      .conn
      .call(move |conn| {
        let placeholders: Vec<String> = (1..=status_strs.len())
          .map(|i| format!("?{i}"))
          .collect();
        let sql = format!(
          "SELECT {ALERT_COLUMNS} FROM alerts
           WHERE status IN ({})
           ORDER BY created_at DESC",
          placeholders.join(", ")
        );
        Ok(read_bundles(
          conn,
          &sql,
          rusqlite::params_from_iter(status_strs.iter()),
        )?)
      })
      .await
      .map_err(db_err)?;
    decode_all(bundles)
  }

  async fn find_by_responder(&self, actor: Uuid) -> Result<Vec<Alert>> {
    let actor_str = encode_uuid(actor);
    let bundles = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT a.alert_id, a.owner_id, a.status, a.canonical_lat,
                  a.canonical_lng, a.contacts_notified, a.description,
                  a.notes, a.created_at, a.resolved_at
           FROM alerts a
           JOIN alert_responders r ON r.alert_id = a.alert_id
           WHERE r.actor_id = ?1
           ORDER BY a.created_at DESC"
        );
        Ok(read_bundles(conn, &sql, rusqlite::params![actor_str])?)
      })
      .await
      .map_err(db_err)?;
    decode_all(bundles)
  }

  async fn update_status(&self, id: Uuid, update: StatusUpdate) -> Result<Alert> {
    let id_str       = encode_uuid(id);
    let expected_str = update.expected.map(encode_status);
    let to_str       = encode_status(update.to);
    let to_terminal  = update.to.is_terminal();
    let notes        = update.notes.clone();
    let origin_str   = encode_origin(update.origin).to_owned();
    let actor_str    = encode_uuid(update.actor_id);
    let change_str   = encode_uuid(Uuid::new_v4());
    let now_str      = encode_dt(Utc::now());

    let outcome: StatusWrite = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let row: Option<(String, Option<String>)> = tx
          .query_row(
            "SELECT status, resolved_at FROM alerts WHERE alert_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let (actual, prior_resolved_at) = match row {
          Some(pair) => pair,
          None => return Ok(StatusWrite::NotFound),
        };

        if let Some(expected) = &expected_str
          && *expected != actual
        {
          return Ok(StatusWrite::Conflict { actual });
        }

        // resolved_at: set on entry into a terminal state, kept across
        // terminal-to-terminal overrides, cleared when re-opened.
        let resolved_at = if to_terminal {
          if is_terminal_str(&actual) {
            prior_resolved_at
          } else {
            Some(now_str.clone())
          }
        } else {
          None
        };

        tx.execute(
          "UPDATE alerts
           SET status = ?1, notes = COALESCE(?2, notes), resolved_at = ?3
           WHERE alert_id = ?4",
          rusqlite::params![to_str, notes, resolved_at, id_str],
        )?;

        tx.execute(
          "INSERT INTO status_changes
             (change_id, alert_id, from_status, to_status, origin, actor_id,
              recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            change_str, id_str, actual, to_str, origin_str, actor_str,
            now_str,
          ],
        )?;

        tx.commit()?;

        match read_bundle(conn, &id_str)? {
          Some(bundle) => Ok(StatusWrite::Done(bundle)),
          None => Ok(StatusWrite::NotFound),
        }
      })
      .await
      .map_err(db_err)?;

    match outcome {
      StatusWrite::Done(bundle) => Ok(bundle.into_alert()?),
      StatusWrite::NotFound => Err(Error::AlertNotFound(id)),
      StatusWrite::Conflict { actual } => Err(Error::StatusConflict {
        id,
        actual: crate::encode::decode_status(&actual)?,
      }),
    }
  }

  async fn claim(&self, id: Uuid, actor: Uuid) -> Result<ClaimOutcome> {
    let id_str     = encode_uuid(id);
    let actor_str  = encode_uuid(actor);
    let change_str = encode_uuid(Uuid::new_v4());
    let now_str    = encode_dt(Utc::now());

    let outcome: ClaimWrite = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM alerts WHERE alert_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let status = match status {
          Some(s) => s,
          None => return Ok(ClaimWrite::NotFound),
        };
        if is_terminal_str(&status) {
          return Ok(ClaimWrite::InvalidState { status });
        }

        // Idempotent set add: the primary key swallows repeat claims.
        let newly_joined = tx.execute(
          "INSERT OR IGNORE INTO alert_responders (alert_id, actor_id, joined_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, actor_str, now_str],
        )? == 1;

        // The flip fires at most once: the WHERE clause only matches while
        // the alert is still in its initial status.
        let transitioned = tx.execute(
          "UPDATE alerts SET status = 'en_route'
           WHERE alert_id = ?1 AND status = 'active'",
          rusqlite::params![id_str],
        )? == 1;

        if transitioned {
          tx.execute(
            "INSERT INTO status_changes
               (change_id, alert_id, from_status, to_status, origin,
                actor_id, recorded_at)
             VALUES (?1, ?2, 'active', 'en_route', 'claim', ?3, ?4)",
            rusqlite::params![change_str, id_str, actor_str, now_str],
          )?;
        }

        tx.commit()?;

        match read_bundle(conn, &id_str)? {
          Some(bundle) => {
            Ok(ClaimWrite::Done { bundle, newly_joined, transitioned })
          }
          None => Ok(ClaimWrite::NotFound),
        }
      })
      .await
      .map_err(db_err)?;

    match outcome {
      ClaimWrite::Done { bundle, newly_joined, transitioned } => {
        Ok(ClaimOutcome { alert: bundle.into_alert()?, newly_joined, transitioned })
      }
      ClaimWrite::NotFound => Err(Error::AlertNotFound(id)),
      ClaimWrite::InvalidState { status } => Err(Error::InvalidState {
        id,
        status: crate::encode::decode_status(&status)?,
      }),
    }
  }

  async fn append_location(
    &self,
    id: Uuid,
    sample: NewLocationSample,
  ) -> Result<Alert> {
    let id_str       = encode_uuid(id);
    let lat          = sample.coordinates.latitude;
    let lng          = sample.coordinates.longitude;
    let accuracy     = sample.accuracy;
    let captured_str = sample.captured_at.map(encode_dt);
    let now_str      = encode_dt(Utc::now());

    let outcome: AppendWrite = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM alerts WHERE alert_id = ?1",
            rusqlite::params![id_str],
            |r| r.get(0),
          )
          .optional()?;

        let status = match status {
          Some(s) => s,
          None => return Ok(AppendWrite::NotFound),
        };
        if is_terminal_str(&status) {
          return Ok(AppendWrite::InvalidState { status });
        }

        // Receipt order: the next sequence number is computed inside the
        // transaction, so concurrent appends cannot collide or reorder.
        tx.execute(
          "INSERT INTO location_samples
             (alert_id, seq, latitude, longitude, accuracy, captured_at,
              recorded_at)
           SELECT ?1, COALESCE(MAX(seq), 0) + 1, ?2, ?3, ?4, ?5, ?6
           FROM location_samples WHERE alert_id = ?1",
          rusqlite::params![id_str, lat, lng, accuracy, captured_str, now_str],
        )?;

        tx.execute(
          "UPDATE alerts SET canonical_lat = ?1, canonical_lng = ?2
           WHERE alert_id = ?3",
          rusqlite::params![lat, lng, id_str],
        )?;

        tx.commit()?;

        match read_bundle(conn, &id_str)? {
          Some(bundle) => Ok(AppendWrite::Done(bundle)),
          None => Ok(AppendWrite::NotFound),
        }
      })
      .await
      .map_err(db_err)?;

    match outcome {
      AppendWrite::Done(bundle) => Ok(bundle.into_alert()?),
      AppendWrite::NotFound => Err(Error::AlertNotFound(id)),
      AppendWrite::InvalidState { status } => Err(Error::InvalidState {
        id,
        status: crate::encode::decode_status(&status)?,
      }),
    }
  }

  async fn set_description(&self, id: Uuid, description: String) -> Result<Alert> {
    let id_str = encode_uuid(id);
    let bundle = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE alerts SET description = ?1 WHERE alert_id = ?2",
          rusqlite::params![description, id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(read_bundle(conn, &id_str)?)
      })
      .await
      .map_err(db_err)?;

    match bundle {
      Some(b) => Ok(b.into_alert()?),
      None => Err(Error::AlertNotFound(id)),
    }
  }

  async fn mark_contacts_notified(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE alerts SET contacts_notified = 1 WHERE alert_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if changed == 0 {
      return Err(Error::AlertNotFound(id));
    }
    Ok(())
  }

  async fn status_history(&self, id: Uuid) -> Result<Vec<StatusChange>> {
    let id_str = encode_uuid(id);
    let raws: Vec<RawStatusChange> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT change_id, alert_id, from_status, to_status, origin,
                  actor_id, recorded_at
           FROM status_changes WHERE alert_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawStatusChange {
              change_id:   row.get(0)?,
              alert_id:    row.get(1)?,
              from_status: row.get(2)?,
              to_status:   row.get(3)?,
              origin:      row.get(4)?,
              actor_id:    row.get(5)?,
              recorded_at: row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    Ok(
      raws
        .into_iter()
        .map(RawStatusChange::into_change)
        .collect::<std::result::Result<_, _>>()?,
    )
  }
}

fn decode_all(bundles: Vec<RawAlertBundle>) -> Result<Vec<Alert>> {
  Ok(
    bundles
      .into_iter()
      .map(RawAlertBundle::into_alert)
      .collect::<std::result::Result<_, _>>()?,
  )
}
