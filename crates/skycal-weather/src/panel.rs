//! Foreground display state for the weather panel.

use std::fmt;

use tracing::debug;

use crate::{Ticket, WeatherCompletion, WeatherRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WeatherDisplay {
  #[default]
  Idle,
  Pending {
    ticket:   Ticket,
    location: String,
  },
  Ready {
    ticket: Ticket,
    record: WeatherRecord,
  },
  Failed {
    ticket:   Ticket,
    location: String,
    message:  String,
  },
}

impl fmt::Display for WeatherDisplay {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WeatherDisplay::Idle => Ok(()),
      WeatherDisplay::Pending { location, .. } => write!(f, "Fetching weather for {location}…"),
      WeatherDisplay::Ready { record, .. } => write!(f, "{record}"),
      WeatherDisplay::Failed { message, .. } => write!(f, "Error fetching weather: {message}"),
    }
  }
}

/// Holds what the weather panel shows. Only the newest dispatched lookup may
/// change it; completions for superseded tickets are dropped.
#[derive(Debug, Default)]
pub struct WeatherPanel {
  display: WeatherDisplay,
  latest:  Option<Ticket>,
}

impl WeatherPanel {
  pub fn display(&self) -> &WeatherDisplay { &self.display }

  /// Record that `ticket` was dispatched for `location` and show it as
  /// pending.
  pub fn begin(&mut self, ticket: Ticket, location: &str) {
    self.latest = Some(ticket);
    self.display = WeatherDisplay::Pending { ticket, location: location.to_owned() };
  }

  /// Show a completed lookup. Returns `false`, leaving the display alone,
  /// when the completion belongs to an older ticket than the latest begun.
  pub fn apply(&mut self, done: WeatherCompletion) -> bool {
    if self.latest.is_some_and(|latest| done.ticket < latest) {
      debug!(ticket = %done.ticket, location = %done.location, "discarding stale weather result");
      return false;
    }
    self.latest = Some(done.ticket);

    self.display = match done.outcome {
      Ok(record) => WeatherDisplay::Ready { ticket: done.ticket, record },
      Err(err) => WeatherDisplay::Failed {
        ticket:   done.ticket,
        location: done.location,
        message:  err.to_string(),
      },
    };
    true
  }
}
