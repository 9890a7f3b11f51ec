//! HTTP client for the current-weather provider.

use std::{fmt, time::Duration};

use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{WeatherError, WeatherRecord, record::parse_reply};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_LOCATION: &str = "Warsaw";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Measurement system requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
  #[default]
  Metric,
  Imperial,
  /// Kelvin and metres per second.
  Standard,
}

impl Units {
  pub fn as_str(self) -> &'static str {
    match self {
      Units::Metric => "metric",
      Units::Imperial => "imperial",
      Units::Standard => "standard",
    }
  }

  pub fn temperature_suffix(self) -> &'static str {
    match self {
      Units::Metric => "°C",
      Units::Imperial => "°F",
      Units::Standard => " K",
    }
  }

  pub fn speed_suffix(self) -> &'static str {
    match self {
      Units::Imperial => "mph",
      Units::Metric | Units::Standard => "m/s",
    }
  }
}

impl fmt::Display for Units {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Connection settings for the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
  pub api_key:          String,
  pub base_url:         String,
  pub units:            Units,
  /// Language code for the condition description.
  pub lang:             String,
  /// Location used when the caller does not name one.
  pub default_location: String,
}

impl Default for WeatherConfig {
  fn default() -> Self {
    Self {
      api_key:          String::new(),
      base_url:         DEFAULT_BASE_URL.to_owned(),
      units:            Units::default(),
      lang:             "en".to_owned(),
      default_location: DEFAULT_LOCATION.to_owned(),
    }
  }
}

/// Async client for the provider's current-weather endpoint.
///
/// Holds no per-lookup state, so one client can serve any number of
/// concurrent lookups.
#[derive(Debug, Clone)]
pub struct WeatherClient {
  client: Client,
  config: WeatherConfig,
}

impl WeatherClient {
  pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &WeatherConfig { &self.config }

  /// `GET <base_url>?q=<location>&appid=<key>&units=<units>&lang=<lang>`
  ///
  /// `location` is sent as given; callers validate it first.
  pub async fn lookup(&self, location: &str) -> Result<WeatherRecord, WeatherError> {
    debug!(location, "requesting current weather");
    let resp = self
      .client
      .get(&self.config.base_url)
      .query(&[
        ("q", location),
        ("appid", self.config.api_key.as_str()),
        ("units", self.config.units.as_str()),
        ("lang", self.config.lang.as_str()),
      ])
      .send()
      .await?;

    let status = resp.status().as_u16();
    let body = resp.text().await?;
    parse_reply(status, &body, self.config.units, Local::now())
  }
}
