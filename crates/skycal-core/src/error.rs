//! Error types for `skycal-core`.
//!
//! Every variant is a recoverable, user-facing condition. Storage faults live
//! in the backend's own error type and are never folded into this enum.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// A required text field was empty or whitespace-only.
  #[error("{0} must not be empty")]
  InvalidInput(&'static str),

  #[error("user {0:?} already exists")]
  DuplicateUser(String),

  #[error("invalid username or password")]
  AuthError,

  #[error("user {0:?} does not exist")]
  UserNotFound(String),

  #[error("access denied")]
  AccessDenied,

  /// The actor has no calendar to post into. Unreachable while the
  /// default-calendar invariant holds.
  #[error("no accessible calendar")]
  NoAccessibleCalendar,

  #[error("calendar not found: {0}")]
  CalendarNotFound(i64),

  #[error("event not found: {0}")]
  EventNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
