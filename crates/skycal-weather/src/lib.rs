//! On-demand weather lookup for skycal.
//!
//! A lookup is dispatched with [`WeatherFetcher::fetch`], which validates the
//! location synchronously and returns a [`Ticket`] straight away. The HTTP
//! round trip runs on its own tokio task; its [`WeatherCompletion`] arrives
//! on the [`WeatherInbox`] held by the foreground loop, which is the only
//! place [`WeatherPanel`] display state is written.
//!
//! ```rust,ignore
//! let (mut fetcher, mut inbox) = WeatherFetcher::new(client);
//! let mut panel = WeatherPanel::default();
//! panel.begin(fetcher.fetch("Warsaw")?, "Warsaw");
//! // ... other foreground work ...
//! if let Some(done) = inbox.recv().await {
//!   panel.apply(done);
//! }
//! ```

mod client;
mod error;
mod fetcher;
mod panel;
mod record;

pub use client::{Units, WeatherClient, WeatherConfig};
pub use error::WeatherError;
pub use fetcher::{Ticket, WeatherCompletion, WeatherFetcher, WeatherInbox};
pub use panel::{WeatherDisplay, WeatherPanel};
pub use record::WeatherRecord;
