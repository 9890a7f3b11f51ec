//! Subcommand bodies. Each returns the text to print on success.

use std::fmt::Write as _;

use chrono::NaiveDate;
use skycal_core::{
  access,
  calendar::{ShareOutcome, Visibility},
  store::CalendarStore,
  user::{Session, register_and_sign_in},
};
use skycal_weather::{WeatherFetcher, WeatherInbox, WeatherPanel};

// ── Accounts ────────────────────────────────────────────────────────────────

pub async fn register<S: CalendarStore>(
  store: &S,
  username: &str,
  password: &str,
) -> Result<String, S::Error> {
  let session = register_and_sign_in(store, username, password).await?;
  let owned = store.owned_calendars(&session).await?;
  let mut out = format!("Registered {}.", session.username());
  if let Some(first) = owned.first() {
    let _ = write!(out, " Default calendar: #{} \"{}\".", first.id, first.name);
  }
  Ok(out)
}

// ── Calendars ───────────────────────────────────────────────────────────────

pub async fn calendars<S: CalendarStore>(store: &S, session: &Session) -> Result<String, S::Error> {
  let visible = store.visible_calendars(session).await?;
  if visible.is_empty() {
    return Ok("No calendars.".into());
  }
  let mut out = String::new();
  for cal in &visible {
    let _ = writeln!(out, "{:>4}  {}", cal.id, cal.name);
  }
  Ok(out.trim_end().to_owned())
}

pub async fn my_calendars<S: CalendarStore>(
  store: &S,
  session: &Session,
) -> Result<String, S::Error> {
  let owned = store.owned_calendars(session).await?;
  if owned.is_empty() {
    return Ok("You own no calendars.".into());
  }
  let mut out = String::new();
  for cal in &owned {
    let _ = writeln!(out, "{:>4}  {}  ({})", cal.id, cal.name, cal.visibility);
  }
  Ok(out.trim_end().to_owned())
}

pub async fn create_calendar<S: CalendarStore>(
  store: &S,
  session: &Session,
  name: &str,
  visibility: Visibility,
) -> Result<String, S::Error> {
  let cal = store.create_calendar(session, name, visibility).await?;
  Ok(format!("Created calendar #{} \"{}\" ({}).", cal.id, cal.name, cal.visibility))
}

pub async fn set_visibility<S: CalendarStore>(
  store: &S,
  session: &Session,
  calendar_id: i64,
  visibility: Visibility,
) -> Result<String, S::Error> {
  let cal = store.set_visibility(session, calendar_id, visibility).await?;
  Ok(format!("Calendar #{} \"{}\" is now {}.", cal.id, cal.name, cal.visibility))
}

pub async fn toggle_visibility<S: CalendarStore>(
  store: &S,
  session: &Session,
  calendar_id: i64,
) -> Result<String, S::Error> {
  let cal = store.toggle_visibility(session, calendar_id).await?;
  Ok(format!("Calendar #{} \"{}\" is now {}.", cal.id, cal.name, cal.visibility))
}

pub async fn share<S: CalendarStore>(
  store: &S,
  session: &Session,
  calendar_id: i64,
  username: &str,
) -> Result<String, S::Error> {
  let outcome = store.share_calendar(session, calendar_id, username).await?;
  Ok(match outcome {
    ShareOutcome::Shared => format!("Shared calendar #{calendar_id} with {username}."),
    ShareOutcome::AlreadyShared => {
      format!("Calendar #{calendar_id} is already shared with {username}.")
    }
  })
}

pub async fn delete_calendar<S: CalendarStore>(
  store: &S,
  session: &Session,
  calendar_id: i64,
) -> Result<String, S::Error> {
  let deleted = store.delete_calendar(session, calendar_id).await?;
  Ok(format!(
    "Deleted calendar #{} ({} events, {} shares removed).",
    deleted.calendar_id, deleted.events_removed, deleted.shares_removed
  ))
}

// ── Events ──────────────────────────────────────────────────────────────────

/// The day listing. Events the session user may edit are marked `*`.
pub async fn events<S: CalendarStore>(
  store: &S,
  session: &Session,
  date: NaiveDate,
) -> Result<String, S::Error> {
  let listings = store.events_on_date(session, date).await?;
  if listings.is_empty() {
    return Ok(format!("No events on {date}."));
  }
  let mut out = format!("Events on {date}:");
  for listing in &listings {
    let mark = if access::can_edit_event(session, &listing.event) { '*' } else { ' ' };
    let _ = write!(out, "\n{:>4}{mark} {listing}", listing.event.id);
  }
  Ok(out)
}

pub async fn add_event<S: CalendarStore>(
  store: &S,
  session: &Session,
  calendar_id: i64,
  date: NaiveDate,
  description: &str,
) -> Result<String, S::Error> {
  let visible = store.visible_calendars(session).await?;
  let target = access::select_target_calendar(&visible, calendar_id)?;
  let event = store.add_event(session, target.id, date, description).await?;
  Ok(format!(
    "Added event #{} to \"{}\" on {}.",
    event.id, target.name, event.date
  ))
}

pub async fn edit_event<S: CalendarStore>(
  store: &S,
  session: &Session,
  event_id: i64,
  description: &str,
) -> Result<String, S::Error> {
  let event = store.update_event(session, event_id, description).await?;
  Ok(format!("Updated event #{}: {}", event.id, event.description))
}

pub async fn delete_event<S: CalendarStore>(
  store: &S,
  session: &Session,
  event_id: i64,
) -> Result<String, S::Error> {
  store.delete_event(session, event_id).await?;
  Ok(format!("Deleted event #{event_id}."))
}

// ── Weather ─────────────────────────────────────────────────────────────────

/// Look up `location` and wait for the result.
pub async fn weather(
  fetcher: &mut WeatherFetcher,
  inbox: &mut WeatherInbox,
  location: &str,
) -> skycal_core::Result<String> {
  let mut panel = WeatherPanel::default();
  panel.begin(fetcher.fetch(location)?, location);
  settle(&mut panel, inbox).await;
  Ok(panel.display().to_string())
}

/// The day listing with the weather panel below it. The lookup is dispatched
/// first and runs while the listing is read from the store.
pub async fn agenda<S: CalendarStore>(
  store: &S,
  session: &Session,
  date: NaiveDate,
  fetcher: &mut WeatherFetcher,
  inbox: &mut WeatherInbox,
  location: &str,
) -> Result<String, S::Error> {
  let mut panel = WeatherPanel::default();
  panel.begin(fetcher.fetch(location)?, location);

  let listing = events(store, session, date).await?;

  settle(&mut panel, inbox).await;
  Ok(format!("{listing}\n\n{}", panel.display()))
}

/// Apply completions until the panel shows the latest lookup's outcome.
async fn settle(panel: &mut WeatherPanel, inbox: &mut WeatherInbox) {
  while let Some(done) = inbox.recv().await {
    if panel.apply(done) {
      break;
    }
  }
}
