//! SQL schema for the Beacon SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Alerts are never deleted; terminal states are retained for history/audit.
CREATE TABLE IF NOT EXISTS alerts (
    alert_id          TEXT PRIMARY KEY,
    owner_id          TEXT NOT NULL,
    status            TEXT NOT NULL,   -- 'active'|'en_route'|'on_scene'|'resolved'|'cancelled'
    canonical_lat     REAL NOT NULL,   -- latest appended sample
    canonical_lng     REAL NOT NULL,
    contacts_notified INTEGER NOT NULL DEFAULT 0,
    description       TEXT,
    notes             TEXT,            -- free-text resolution note
    created_at        TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    resolved_at       TEXT
);

-- At most one open alert per owner. The partial unique index makes the
-- invariant hold even when two creates race.
CREATE UNIQUE INDEX IF NOT EXISTS alerts_owner_open_idx
    ON alerts(owner_id)
    WHERE status IN ('active', 'en_route', 'on_scene');

-- Location samples are strictly append-only.
-- (alert_id, seq) is server receipt order; no UPDATE or DELETE is ever
-- issued against this table.
CREATE TABLE IF NOT EXISTS location_samples (
    alert_id    TEXT NOT NULL REFERENCES alerts(alert_id),
    seq         INTEGER NOT NULL,
    latitude    REAL NOT NULL,
    longitude   REAL NOT NULL,
    accuracy    REAL,
    captured_at TEXT,                  -- client-reported; never used for ordering
    recorded_at TEXT NOT NULL,
    PRIMARY KEY (alert_id, seq)
);

-- The responding set. The primary key makes claims idempotent
-- (INSERT OR IGNORE); membership is removed only by admin intervention.
CREATE TABLE IF NOT EXISTS alert_responders (
    alert_id  TEXT NOT NULL REFERENCES alerts(alert_id),
    actor_id  TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    PRIMARY KEY (alert_id, actor_id)
);

-- Append-only status audit trail. Admin overrides are recorded with their
-- own origin so they stay distinguishable from actor-driven transitions.
CREATE TABLE IF NOT EXISTS status_changes (
    change_id   TEXT PRIMARY KEY,
    alert_id    TEXT NOT NULL REFERENCES alerts(alert_id),
    from_status TEXT NOT NULL,
    to_status   TEXT NOT NULL,
    origin      TEXT NOT NULL,   -- 'claim'|'advance'|'cancel'|'admin_override'
    actor_id    TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS alerts_owner_idx          ON alerts(owner_id);
CREATE INDEX IF NOT EXISTS alerts_status_idx         ON alerts(status);
CREATE INDEX IF NOT EXISTS responders_actor_idx      ON alert_responders(actor_id);
CREATE INDEX IF NOT EXISTS status_changes_alert_idx  ON status_changes(alert_id);

PRAGMA user_version = 1;
";
