//! Error type for `skycal-weather`.

use thiserror::Error;

/// Why a weather lookup produced no record. Every variant carries a message
/// suitable for display.
#[derive(Debug, Error)]
pub enum WeatherError {
  /// The provider answered but did not report success (unknown city, bad
  /// API key, quota exceeded, ...).
  #[error("{message} (code {code})")]
  Provider { code: String, message: String },

  /// The request never got a usable answer (DNS, connect, timeout, ...).
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// The provider reported success but the payload could not be read.
  #[error("malformed response: {0}")]
  Malformed(String),

  /// The lookup task died before producing an answer.
  #[error("lookup did not finish: {0}")]
  Interrupted(String),
}

impl WeatherError {
  /// The provider's own message, if the provider produced one.
  pub fn provider_message(&self) -> Option<&str> {
    match self {
      WeatherError::Provider { message, .. } => Some(message),
      _ => None,
    }
  }
}
