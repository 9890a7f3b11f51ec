//! Background dispatch of weather lookups.

use std::{fmt, sync::Arc};

use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{WeatherClient, WeatherError, WeatherRecord};

/// Identifies one dispatched lookup. Tickets increase with every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub(crate) u64);

impl fmt::Display for Ticket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{}", self.0) }
}

/// The result of one lookup, delivered to the foreground.
#[derive(Debug)]
pub struct WeatherCompletion {
  pub ticket:   Ticket,
  pub location: String,
  pub outcome:  Result<WeatherRecord, WeatherError>,
}

/// Dispatches lookups onto tokio tasks without waiting for them.
pub struct WeatherFetcher {
  client: Arc<WeatherClient>,
  tx:     mpsc::UnboundedSender<WeatherCompletion>,
  next:   u64,
}

/// Receiving half paired with a [`WeatherFetcher`].
pub struct WeatherInbox {
  rx: mpsc::UnboundedReceiver<WeatherCompletion>,
}

impl WeatherFetcher {
  pub fn new(client: WeatherClient) -> (WeatherFetcher, WeatherInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let fetcher = WeatherFetcher { client: Arc::new(client), tx, next: 0 };
    (fetcher, WeatherInbox { rx })
  }

  /// Start a lookup for `location` and return immediately.
  ///
  /// A blank location is rejected here and nothing is dispatched. Must be
  /// called from within a tokio runtime.
  pub fn fetch(&mut self, location: &str) -> skycal_core::Result<Ticket> {
    let location = skycal_core::input::required("location", location)?.to_owned();

    self.next += 1;
    let ticket = Ticket(self.next);
    let client = Arc::clone(&self.client);
    let tx = self.tx.clone();

    debug!(%ticket, %location, "dispatching weather lookup");
    let lookup = {
      let location = location.clone();
      tokio::spawn(async move { client.lookup(&location).await })
    };
    tokio::spawn(deliver(tx, ticket, location, lookup));

    Ok(ticket)
  }
}

/// Wait for `lookup` and send its outcome. A lookup that panics or is
/// cancelled still produces a completion, so the inbox never waits forever.
async fn deliver(
  tx: mpsc::UnboundedSender<WeatherCompletion>,
  ticket: Ticket,
  location: String,
  lookup: JoinHandle<Result<WeatherRecord, WeatherError>>,
) {
  let outcome = lookup
    .await
    .unwrap_or_else(|e| Err(WeatherError::Interrupted(e.to_string())));
  let done = WeatherCompletion { ticket, location, outcome };
  if tx.send(done).is_err() {
    warn!(%ticket, "weather inbox closed before lookup finished");
  }
}

impl WeatherInbox {
  /// Wait for the next completed lookup.
  pub async fn recv(&mut self) -> Option<WeatherCompletion> { self.rx.recv().await }

  /// A completed lookup, if one is already waiting.
  pub fn try_recv(&mut self) -> Option<WeatherCompletion> { self.rx.try_recv().ok() }
}
