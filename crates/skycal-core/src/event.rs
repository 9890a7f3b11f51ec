//! Dated events and their per-date listing form.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An event on a calendar date. Belongs to exactly one calendar and one
/// author; only the author may change or delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:          i64,
  /// The authoring user.
  pub user_id:     i64,
  pub date:        NaiveDate,
  pub description: String,
  pub calendar_id: i64,
}

/// An event joined with the names needed to show it in a day listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListing {
  pub event:           Event,
  pub calendar_name:   String,
  pub author_username: String,
}

impl fmt::Display for EventListing {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "[{}] ({}) {}",
      self.calendar_name, self.author_username, self.event.description
    )
  }
}
