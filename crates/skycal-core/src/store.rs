//! The `CalendarStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `skycal-store-sqlite`).
//! Higher layers (`skycal-cli`) depend on this abstraction, not on any
//! concrete backend.
//!
//! Every access-controlled method takes the acting [`Session`] explicitly and
//! recomputes the session user's rights on each call; nothing is cached
//! between calls because visibility and shares may change in between.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  calendar::{Calendar, DeletedCalendar, ShareOutcome, Visibility, VisibleCalendar},
  event::{Event, EventListing},
  user::{Session, User},
};

/// Abstraction over a skycal store backend.
///
/// Domain failures are reported as [`crate::Error`] converted into the
/// backend's error type; anything else the backend returns is a storage
/// fault.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait CalendarStore: Send + Sync {
  type Error: std::error::Error + From<crate::Error> + Send + Sync + 'static;

  // ── Credential Store ──────────────────────────────────────────────────

  /// Create a user. Blank fields fail with `InvalidInput`, a taken username
  /// with `DuplicateUser`.
  fn register<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Check a credential pair. A mismatch fails with `AuthError`.
  fn authenticate<'a>(
    &'a self,
    username: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Look a user up by exact username.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Calendar Registry ─────────────────────────────────────────────────

  /// Create a calendar owned by the session user. Names need not be unique
  /// but must not be blank.
  fn create_calendar<'a>(
    &'a self,
    session: &'a Session,
    name: &'a str,
    visibility: Visibility,
  ) -> impl Future<Output = Result<Calendar, Self::Error>> + Send + 'a;

  /// Retrieve a calendar by id. Returns `None` if not found.
  fn get_calendar(
    &self,
    calendar_id: i64,
  ) -> impl Future<Output = Result<Option<Calendar>, Self::Error>> + Send + '_;

  /// Calendars owned by the session user, ordered by name
  /// (case-insensitive).
  fn owned_calendars<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<Vec<Calendar>, Self::Error>> + Send + 'a;

  /// Owner-only. Returns the updated calendar.
  fn set_visibility<'a>(
    &'a self,
    session: &'a Session,
    calendar_id: i64,
    visibility: Visibility,
  ) -> impl Future<Output = Result<Calendar, Self::Error>> + Send + 'a;

  /// Owner-only. Flip private↔public and return the updated calendar.
  fn toggle_visibility<'a>(
    &'a self,
    session: &'a Session,
    calendar_id: i64,
  ) -> impl Future<Output = Result<Calendar, Self::Error>> + Send + 'a;

  /// Owner-only. Grant `username` access to the calendar. Sharing twice
  /// yields [`ShareOutcome::AlreadyShared`]; an unknown user fails with
  /// `UserNotFound`.
  fn share_calendar<'a>(
    &'a self,
    session: &'a Session,
    calendar_id: i64,
    username: &'a str,
  ) -> impl Future<Output = Result<ShareOutcome, Self::Error>> + Send + 'a;

  /// Owner-only. Remove the calendar's events, then its shares, then the
  /// calendar itself, as one all-or-nothing unit.
  fn delete_calendar<'a>(
    &'a self,
    session: &'a Session,
    calendar_id: i64,
  ) -> impl Future<Output = Result<DeletedCalendar, Self::Error>> + Send + 'a;

  /// Give `user_id` a private default calendar if they own none. Returns the
  /// calendar when one was created. Safe to call on every login.
  fn ensure_default_calendar(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Option<Calendar>, Self::Error>> + Send + '_;

  // ── Access Controller ─────────────────────────────────────────────────

  /// Owned ∪ public ∪ shared-with calendars, deduplicated by id and ordered
  /// by name (case-insensitive).
  fn visible_calendars<'a>(
    &'a self,
    session: &'a Session,
  ) -> impl Future<Output = Result<Vec<VisibleCalendar>, Self::Error>> + Send + 'a;

  // ── Event Ledger ──────────────────────────────────────────────────────

  /// Add an event to a calendar visible to the session user.
  fn add_event<'a>(
    &'a self,
    session: &'a Session,
    calendar_id: i64,
    date: NaiveDate,
    description: &'a str,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + 'a;

  /// Retrieve an event by id. Returns `None` if not found.
  fn get_event(
    &self,
    event_id: i64,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Events on `date` in any calendar currently visible to the session user,
  /// grouped by calendar name and in creation order within a calendar.
  fn events_on_date<'a>(
    &'a self,
    session: &'a Session,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<EventListing>, Self::Error>> + Send + 'a;

  /// Author-only. Replace the description and return the updated event.
  fn update_event<'a>(
    &'a self,
    session: &'a Session,
    event_id: i64,
    description: &'a str,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + 'a;

  /// Author-only.
  fn delete_event<'a>(
    &'a self,
    session: &'a Session,
    event_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
