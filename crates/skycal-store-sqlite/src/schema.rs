//! SQL schema for the skycal SQLite store.
//!
//! The schema version lives in `PRAGMA user_version`. Startup reads it and
//! applies whatever steps are missing; every step is idempotent, so running
//! it against an existing store is safe.

use rusqlite::Connection;
use skycal_core::calendar::{DEFAULT_CALENDAR_NAME, Visibility};

use crate::encode::encode_visibility;

/// Version written after a successful [`migrate`].
pub const SCHEMA_VERSION: i64 = 1;

/// Connection-level settings applied on every open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Version 1: the four relations.
const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS users (
    id        INTEGER PRIMARY KEY,
    username  TEXT UNIQUE NOT NULL,   -- case-sensitive
    password  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS calendars (
    id          INTEGER PRIMARY KEY,
    owner_id    INTEGER NOT NULL REFERENCES users(id),
    name        TEXT NOT NULL,
    visibility  TEXT NOT NULL CHECK (visibility IN ('private', 'public'))
);

CREATE TABLE IF NOT EXISTS calendar_shares (
    calendar_id  INTEGER NOT NULL REFERENCES calendars(id),
    user_id      INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (calendar_id, user_id)
);

CREATE TABLE IF NOT EXISTS events (
    id           INTEGER PRIMARY KEY,
    user_id      INTEGER NOT NULL REFERENCES users(id),
    date         TEXT NOT NULL,       -- ISO YYYY-MM-DD
    description  TEXT NOT NULL,
    calendar_id  INTEGER NOT NULL REFERENCES calendars(id)
);

CREATE INDEX IF NOT EXISTS calendars_owner_idx ON calendars(owner_id);
CREATE INDEX IF NOT EXISTS shares_user_idx     ON calendar_shares(user_id);
CREATE INDEX IF NOT EXISTS events_date_idx     ON events(date);
CREATE INDEX IF NOT EXISTS events_calendar_idx ON events(calendar_id);
";

/// What a [`migrate`] run did to events written before calendars existed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
  /// Events moved into their author's default calendar.
  pub adopted: usize,
  /// Events removed because their author no longer exists.
  pub dropped: usize,
}

/// Bring `conn` from version `found` up to [`SCHEMA_VERSION`].
///
/// The caller rejects versions newer than [`SCHEMA_VERSION`] before calling
/// this.
pub fn migrate(conn: &Connection, found: i64) -> rusqlite::Result<Migration> {
  let mut report = Migration::default();
  if found < 1 {
    // Stores written before versioning may carry an `events` table that
    // predates calendars.
    let legacy_events =
      table_exists(conn, "events")? && !column_exists(conn, "events", "calendar_id")?;
    if legacy_events {
      conn.execute_batch(
        "ALTER TABLE events ADD COLUMN calendar_id INTEGER REFERENCES calendars(id);",
      )?;
    }
    conn.execute_batch(SCHEMA_V1)?;
    if legacy_events {
      report = adopt_legacy_events(conn)?;
    }
  }
  conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
  Ok(report)
}

/// Every event must belong to a calendar. Pre-calendar events go to their
/// author's default calendar, created if the author owns none; events with no
/// surviving author cannot be placed and are deleted.
fn adopt_legacy_events(conn: &Connection) -> rusqlite::Result<Migration> {
  conn.execute(
    "INSERT INTO calendars (owner_id, name, visibility)
     SELECT DISTINCT e.user_id, ?1, ?2
       FROM events e
       JOIN users u ON u.id = e.user_id
      WHERE e.calendar_id IS NULL
        AND NOT EXISTS (SELECT 1 FROM calendars c WHERE c.owner_id = e.user_id)",
    rusqlite::params![DEFAULT_CALENDAR_NAME, encode_visibility(Visibility::Private)],
  )?;

  let adopted = conn.execute(
    "UPDATE events
        SET calendar_id = (
          SELECT c.id FROM calendars c
           WHERE c.owner_id = events.user_id
           ORDER BY c.name = ?1 DESC, c.id
           LIMIT 1)
      WHERE calendar_id IS NULL
        AND user_id IN (SELECT id FROM users)",
    rusqlite::params![DEFAULT_CALENDAR_NAME],
  )?;
  let dropped = conn.execute("DELETE FROM events WHERE calendar_id IS NULL", [])?;

  Ok(Migration { adopted, dropped })
}

pub fn user_version(conn: &Connection) -> rusqlite::Result<i64> {
  conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
    [table],
    |row| row.get(0),
  )
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
  conn.query_row(
    "SELECT EXISTS (SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2)",
    [table, column],
    |row| row.get(0),
  )
}
