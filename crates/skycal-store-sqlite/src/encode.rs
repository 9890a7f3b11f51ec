//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as ISO `YYYY-MM-DD` strings. Visibility is stored as the
//! lowercase names `private` / `public`.

use chrono::NaiveDate;
use skycal_core::{
  calendar::{Calendar, Visibility},
  event::{Event, EventListing},
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Visibility ──────────────────────────────────────────────────────────────

pub fn encode_visibility(v: Visibility) -> &'static str { v.as_str() }

pub fn decode_visibility(s: &str) -> Result<Visibility> {
  s.parse().map_err(|e: skycal_core::calendar::ParseVisibilityError| {
    Error::InvalidColumn(e.to_string())
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `calendars` row.
pub struct RawCalendar {
  pub id:         i64,
  pub owner_id:   i64,
  pub name:       String,
  pub visibility: String,
}

impl RawCalendar {
  pub const COLUMNS: &'static str = "id, owner_id, name, visibility";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      owner_id:   row.get(1)?,
      name:       row.get(2)?,
      visibility: row.get(3)?,
    })
  }

  pub fn into_calendar(self) -> Result<Calendar> {
    Ok(Calendar {
      id:         self.id,
      owner_id:   self.owner_id,
      name:       self.name,
      visibility: decode_visibility(&self.visibility)?,
    })
  }
}

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub id:          i64,
  pub user_id:     i64,
  pub date:        String,
  pub description: String,
  pub calendar_id: i64,
}

impl RawEvent {
  pub const COLUMNS: &'static str = "id, user_id, date, description, calendar_id";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      user_id:     row.get(1)?,
      date:        row.get(2)?,
      description: row.get(3)?,
      calendar_id: row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      id:          self.id,
      user_id:     self.user_id,
      date:        decode_date(&self.date)?,
      description: self.description,
      calendar_id: self.calendar_id,
    })
  }
}

/// An `events` row joined with its calendar name and author username.
pub struct RawListing {
  pub event:           RawEvent,
  pub calendar_name:   String,
  pub author_username: String,
}

impl RawListing {
  /// Reads the five event columns followed by calendar name and username.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event:           RawEvent::from_row(row)?,
      calendar_name:   row.get(5)?,
      author_username: row.get(6)?,
    })
  }

  pub fn into_listing(self) -> Result<EventListing> {
    Ok(EventListing {
      event:           self.event.into_event()?,
      calendar_name:   self.calendar_name,
      author_username: self.author_username,
    })
  }
}
