//! The weather record and decoding of the provider's current-weather reply.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{WeatherError, client::Units};

/// Current conditions for one location, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
  pub location:     String,
  /// ISO 3166 country code as reported by the provider.
  pub country:      String,
  pub temperature:  f64,
  pub feels_like:   f64,
  pub condition:    String,
  /// Relative humidity, percent.
  pub humidity:     u32,
  /// Sea-level pressure, hPa.
  pub pressure:     u32,
  pub wind_speed:   f64,
  pub units:        Units,
  pub retrieved_at: DateTime<Local>,
}

impl fmt::Display for WeatherRecord {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let t = self.units.temperature_suffix();
    writeln!(f, "{}, {}", self.location, self.country)?;
    writeln!(
      f,
      "Temperature: {}{t} (feels like {}{t})",
      self.temperature, self.feels_like
    )?;
    writeln!(f, "Conditions: {}", capitalize(&self.condition))?;
    writeln!(
      f,
      "Humidity: {}%  |  Pressure: {} hPa",
      self.humidity, self.pressure
    )?;
    writeln!(f, "Wind: {} {}", self.wind_speed, self.units.speed_suffix())?;
    write!(f, "Last updated: {}", self.retrieved_at.format("%H:%M:%S"))
  }
}

fn capitalize(s: &str) -> String {
  let mut chars = s.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

// ─── Provider payload ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CurrentWeather {
  name:    String,
  #[serde(default)]
  sys:     Sys,
  main:    Main,
  #[serde(default)]
  weather: Vec<Condition>,
  wind:    Wind,
}

#[derive(Debug, Default, Deserialize)]
struct Sys {
  #[serde(default)]
  country: String,
}

#[derive(Debug, Deserialize)]
struct Main {
  temp:       f64,
  feels_like: f64,
  humidity:   u32,
  pressure:   u32,
}

#[derive(Debug, Deserialize)]
struct Condition {
  description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
  speed: f64,
}

/// The provider reports its own status in `cod`, as a number on success and
/// usually as a string on failure.
fn reply_code(body: &Value) -> Option<String> {
  match body.get("cod")? {
    Value::Number(n) => Some(n.to_string()),
    Value::String(s) => Some(s.clone()),
    _ => None,
  }
}

/// Decode a reply with HTTP status `status` and raw `body`.
pub(crate) fn parse_reply(
  status: u16,
  body: &str,
  units: Units,
  retrieved_at: DateTime<Local>,
) -> Result<WeatherRecord, WeatherError> {
  let http_ok = (200..300).contains(&status);

  let value: Value = match serde_json::from_str(body) {
    Ok(v) => v,
    Err(e) if http_ok => return Err(WeatherError::Malformed(e.to_string())),
    Err(_) => {
      return Err(WeatherError::Provider {
        code:    status.to_string(),
        message: format!("HTTP {status}"),
      });
    }
  };

  let code = reply_code(&value).unwrap_or_else(|| status.to_string());
  if !http_ok || code != "200" {
    let message = value
      .get("message")
      .and_then(Value::as_str)
      .filter(|m| !m.is_empty())
      .unwrap_or("unknown error")
      .to_owned();
    return Err(WeatherError::Provider { code, message });
  }

  let current: CurrentWeather =
    serde_json::from_value(value).map_err(|e| WeatherError::Malformed(e.to_string()))?;
  let condition = current
    .weather
    .into_iter()
    .next()
    .map(|c| c.description)
    .ok_or_else(|| WeatherError::Malformed("no weather condition in reply".into()))?;

  Ok(WeatherRecord {
    location: current.name,
    country: current.sys.country,
    temperature: current.main.temp,
    feels_like: current.main.feels_like,
    condition,
    humidity: current.main.humidity,
    pressure: current.main.pressure,
    wind_speed: current.wind.speed,
    units,
    retrieved_at,
  })
}
