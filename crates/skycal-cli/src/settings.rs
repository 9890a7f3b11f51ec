//! Layered configuration: defaults, then the optional TOML file, then
//! `SKYCAL_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use skycal_weather::WeatherConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path: PathBuf,
  pub weather:    WeatherConfig,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("skycal.db"),
      weather:    WeatherConfig::default(),
    }
  }
}

impl Settings {
  /// Read settings from `path` (which need not exist) and the environment.
  /// Nested keys use `__` in variable names, e.g.
  /// `SKYCAL_WEATHER__API_KEY`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SKYCAL")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_home(&settings.store_path);
    Ok(settings)
  }
}

/// Resolve a path that starts with the `~` component against `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
