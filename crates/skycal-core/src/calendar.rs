//! Calendars, their visibility, and share grants.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Name given to the calendar created for a user who owns none.
pub const DEFAULT_CALENDAR_NAME: &str = "Private";

/// Who besides the owner and explicit share recipients may use a calendar.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  /// Owner and explicit shares only.
  #[default]
  Private,
  /// Every registered user may read and post.
  Public,
}

impl Visibility {
  pub fn as_str(self) -> &'static str {
    match self {
      Visibility::Private => "private",
      Visibility::Public => "public",
    }
  }

  /// The other visibility.
  pub fn flipped(self) -> Self {
    match self {
      Visibility::Private => Visibility::Public,
      Visibility::Public => Visibility::Private,
    }
  }
}

impl fmt::Display for Visibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error returned when parsing an unknown visibility string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visibility: {0:?} (expected \"private\" or \"public\")")]
pub struct ParseVisibilityError(pub String);

impl FromStr for Visibility {
  type Err = ParseVisibilityError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "private" => Ok(Visibility::Private),
      "public" => Ok(Visibility::Public),
      other => Err(ParseVisibilityError(other.to_owned())),
    }
  }
}

/// A calendar record. Ownership never transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
  pub id:         i64,
  pub owner_id:   i64,
  pub name:       String,
  pub visibility: Visibility,
}

/// Grants `user_id` access to a calendar regardless of its visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarShare {
  pub calendar_id: i64,
  pub user_id:     i64,
}

/// One entry of a user's visible-calendar set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleCalendar {
  pub id:   i64,
  pub name: String,
}

/// Result of a share request. Re-sharing is expected and harmless, so it is
/// reported rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
  Shared,
  AlreadyShared,
}

/// What a calendar deletion removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCalendar {
  pub calendar_id:    i64,
  pub events_removed: usize,
  pub shares_removed: usize,
}
