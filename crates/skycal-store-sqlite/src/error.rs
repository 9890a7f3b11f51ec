//! Error type for `skycal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule was violated; recoverable and safe to show to the user.
  #[error(transparent)]
  Core(#[from] skycal_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside its domain.
  #[error("invalid stored value: {0}")]
  InvalidColumn(String),

  #[error("database schema version {found} is newer than supported version {supported}")]
  UnsupportedSchema { found: i64, supported: i64 },
}

impl Error {
  /// The domain condition behind this error, if it is one.
  pub fn as_domain(&self) -> Option<&skycal_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }

  /// Whether the error is a user mistake rather than a storage fault.
  /// Storage faults indicate corruption or I/O failure and must not be
  /// swallowed.
  pub fn is_user_facing(&self) -> bool { self.as_domain().is_some() }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
