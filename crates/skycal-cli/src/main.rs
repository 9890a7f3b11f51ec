//! `skycal` — shared calendars with on-demand weather, from the terminal.
//!
//! # Usage
//!
//! ```text
//! skycal --user alice --password secret register
//! skycal --user alice --password secret create-calendar Team --public
//! skycal --user alice --password secret add-event 2 "Standup" --date 2024-05-17
//! skycal --user bob --password hunter2 agenda 2024-05-17
//! skycal weather Gdańsk
//! ```

mod commands;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use settings::Settings;
use skycal_core::{
  calendar::Visibility,
  user::{Session, sign_in},
};
use skycal_store_sqlite::SqliteStore;
use skycal_weather::{WeatherClient, WeatherFetcher, WeatherInbox};
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "skycal", version, about = "Shared calendars with weather")]
struct Cli {
  /// Path to the TOML config file. Missing files are ignored.
  #[arg(short, long, value_name = "FILE", default_value = "skycal.toml", global = true)]
  config: PathBuf,

  /// Account username.
  #[arg(long, env = "SKYCAL_USER", global = true)]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "SKYCAL_PASSWORD", global = true, hide_env_values = true)]
  password: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account with the given credentials.
  Register,
  /// Show current weather (default: the configured location).
  Weather { location: Option<String> },
  #[command(flatten)]
  Account(AccountCommand),
}

/// Commands that act as a signed-in user.
#[derive(Subcommand, Debug)]
enum AccountCommand {
  /// List every calendar you can see.
  Calendars,
  /// List the calendars you own.
  MyCalendars,
  /// Create a calendar you own.
  CreateCalendar {
    name:   String,
    /// Make it visible to every user.
    #[arg(long)]
    public: bool,
  },
  /// Set a calendar you own to private or public.
  SetVisibility {
    calendar_id: i64,
    visibility:  Visibility,
  },
  /// Flip a calendar you own between private and public.
  ToggleVisibility { calendar_id: i64 },
  /// Give another user access to a calendar you own.
  Share { calendar_id: i64, username: String },
  /// Delete a calendar you own along with its events and shares.
  DeleteCalendar { calendar_id: i64 },
  /// List events on a date (default: today).
  Events { date: Option<NaiveDate> },
  /// Add an event to a calendar you can see.
  AddEvent {
    calendar_id: i64,
    description: String,
    /// Event date (default: today).
    #[arg(long)]
    date:        Option<NaiveDate>,
  },
  /// Change the description of an event you wrote.
  EditEvent { event_id: i64, description: String },
  /// Delete an event you wrote.
  DeleteEvent { event_id: i64 },
  /// Events on a date together with the current weather.
  Agenda { date: Option<NaiveDate> },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match run(cli, settings).await {
    Ok(report) => {
      println!("{report}");
      Ok(ExitCode::SUCCESS)
    }
    Err(err) => match user_message(&err) {
      Some(message) => {
        eprintln!("error: {message}");
        Ok(ExitCode::FAILURE)
      }
      None => Err(err),
    },
  }
}

/// Domain failures are reported as plain messages; anything else is a fault
/// and keeps its full context chain.
fn user_message(err: &anyhow::Error) -> Option<String> {
  if let Some(e) = err.downcast_ref::<skycal_store_sqlite::Error>() {
    return e.is_user_facing().then(|| e.to_string());
  }
  err
    .downcast_ref::<skycal_core::Error>()
    .map(ToString::to_string)
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<String> {
  let command = match cli.command {
    Command::Weather { location } => {
      let location = location.unwrap_or_else(|| settings.weather.default_location.clone());
      let (mut fetcher, mut inbox) = weather_fetcher(&settings)?;
      return Ok(commands::weather(&mut fetcher, &mut inbox, &location).await?);
    }
    Command::Register => None,
    Command::Account(command) => Some(command),
  };

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let username = cli.user.unwrap_or_default();
  let password = cli.password.unwrap_or_default();

  let Some(command) = command else {
    return Ok(commands::register(&store, &username, &password).await?);
  };
  let session = sign_in(&store, &username, &password).await?;
  run_signed_in(&store, &session, command, &settings).await
}

async fn run_signed_in(
  store: &SqliteStore,
  s: &Session,
  command: AccountCommand,
  settings: &Settings,
) -> anyhow::Result<String> {
  let today = Local::now().date_naive();

  let report = match command {
    AccountCommand::Calendars => commands::calendars(store, s).await?,
    AccountCommand::MyCalendars => commands::my_calendars(store, s).await?,
    AccountCommand::CreateCalendar { name, public } => {
      let visibility = if public { Visibility::Public } else { Visibility::Private };
      commands::create_calendar(store, s, &name, visibility).await?
    }
    AccountCommand::SetVisibility { calendar_id, visibility } => {
      commands::set_visibility(store, s, calendar_id, visibility).await?
    }
    AccountCommand::ToggleVisibility { calendar_id } => {
      commands::toggle_visibility(store, s, calendar_id).await?
    }
    AccountCommand::Share { calendar_id, username } => {
      commands::share(store, s, calendar_id, &username).await?
    }
    AccountCommand::DeleteCalendar { calendar_id } => {
      commands::delete_calendar(store, s, calendar_id).await?
    }
    AccountCommand::Events { date } => {
      commands::events(store, s, date.unwrap_or(today)).await?
    }
    AccountCommand::AddEvent { calendar_id, description, date } => {
      commands::add_event(store, s, calendar_id, date.unwrap_or(today), &description).await?
    }
    AccountCommand::EditEvent { event_id, description } => {
      commands::edit_event(store, s, event_id, &description).await?
    }
    AccountCommand::DeleteEvent { event_id } => {
      commands::delete_event(store, s, event_id).await?
    }
    AccountCommand::Agenda { date } => {
      let (mut fetcher, mut inbox) = weather_fetcher(settings)?;
      commands::agenda(
        store,
        s,
        date.unwrap_or(today),
        &mut fetcher,
        &mut inbox,
        &settings.weather.default_location,
      )
      .await?
    }
  };
  Ok(report)
}

fn weather_fetcher(
  settings: &Settings,
) -> anyhow::Result<(WeatherFetcher, WeatherInbox)> {
  if settings.weather.api_key.is_empty() {
    warn!("no weather API key configured; set weather.api_key or SKYCAL_WEATHER__API_KEY");
  }
  let client =
    WeatherClient::new(settings.weather.clone()).context("failed to build weather client")?;
  Ok(WeatherFetcher::new(client))
}
