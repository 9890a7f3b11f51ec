//! [`SqliteStore`] — the SQLite implementation of [`CalendarStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use tracing::{debug, info, warn};

use skycal_core::{
  Error as CoreError, access,
  calendar::{
    Calendar, DEFAULT_CALENDAR_NAME, DeletedCalendar, ShareOutcome, Visibility,
    VisibleCalendar,
  },
  event::{Event, EventListing},
  input,
  store::CalendarStore,
  user::{Session, User},
};

use crate::{
  Error, Result,
  encode::{RawCalendar, RawEvent, RawListing, encode_date, encode_visibility},
  schema::{self, Migration, PRAGMAS, SCHEMA_VERSION},
};

// ─── Visibility SQL ──────────────────────────────────────────────────────────
//
// Every statement below binds the acting user's id as `?1`.

/// `(id, name)` of every calendar the user may see: owned, public, or shared.
const VISIBLE_CALENDARS: &str = "
  SELECT id, name FROM calendars
   WHERE visibility = 'public' OR owner_id = ?1
  UNION
  SELECT c.id, c.name FROM calendars c
    JOIN calendar_shares s ON s.calendar_id = c.id
   WHERE s.user_id = ?1";

/// Insert an event only if its calendar is visible to the author.
const INSERT_VISIBLE_EVENT: &str = "
  INSERT INTO events (user_id, date, description, calendar_id)
  SELECT ?1, ?2, ?3, ?4
   WHERE ?4 IN (
     SELECT id FROM calendars WHERE visibility = 'public' OR owner_id = ?1
     UNION
     SELECT calendar_id FROM calendar_shares WHERE user_id = ?1
   )";

const EVENTS_ON_DATE: &str = "
  SELECT e.id, e.user_id, e.date, e.description, e.calendar_id, c.name, u.username
    FROM events e
    JOIN calendars c ON c.id = e.calendar_id
    JOIN users     u ON u.id = e.user_id
   WHERE e.date = ?2
     AND e.calendar_id IN (
       SELECT id FROM calendars WHERE visibility = 'public' OR owner_id = ?1
       UNION
       SELECT calendar_id FROM calendar_shares WHERE user_id = ?1
     )";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A skycal store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All SQL runs
/// on the connection's own thread, one call at a time.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let (found, migration) = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        let found = schema::user_version(conn)?;
        let mut migration = Migration::default();
        if found <= SCHEMA_VERSION {
          let tx = conn.transaction()?;
          migration = schema::migrate(&tx, found)?;
          tx.commit()?;
        }
        Ok((found, migration))
      })
      .await?;

    if found > SCHEMA_VERSION {
      return Err(Error::UnsupportedSchema { found, supported: SCHEMA_VERSION });
    }
    if found < SCHEMA_VERSION {
      info!(
        from = found,
        to = SCHEMA_VERSION,
        adopted_events = migration.adopted,
        "migrated store schema"
      );
    }
    if migration.dropped > 0 {
      warn!(dropped = migration.dropped, "removed legacy events with no author");
    }
    Ok(())
  }

  /// Load a calendar the session user owns.
  ///
  /// Missing calendars are `CalendarNotFound`; someone else's are
  /// `AccessDenied`.
  async fn owned_calendar(&self, session: &Session, calendar_id: i64) -> Result<Calendar> {
    let calendar = self
      .get_calendar(calendar_id)
      .await?
      .ok_or(CoreError::CalendarNotFound(calendar_id))?;
    access::require_calendar_owner(session, &calendar)?;
    Ok(calendar)
  }

  /// Load an event the session user authored.
  async fn authored_event(&self, session: &Session, event_id: i64) -> Result<Event> {
    let event = self
      .get_event(event_id)
      .await?
      .ok_or(CoreError::EventNotFound(event_id))?;
    access::require_event_author(session, &event)?;
    Ok(event)
  }
}

// ─── CalendarStore impl ──────────────────────────────────────────────────────

impl CalendarStore for SqliteStore {
  type Error = Error;

  // ── Credential Store ──────────────────────────────────────────────────────

  async fn register(&self, username: &str, password: &str) -> Result<User> {
    let username = input::required("username", username)?.to_owned();
    let password = input::required("password", password)?.to_owned();

    let name = username.clone();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO users (username, password) VALUES (?1, ?2)
           ON CONFLICT (username) DO NOTHING",
          rusqlite::params![name, password],
        )?;
        Ok((inserted > 0).then(|| conn.last_insert_rowid()))
      })
      .await?;

    let id = id.ok_or_else(|| CoreError::DuplicateUser(username.clone()))?;
    info!(user_id = id, %username, "registered user");
    Ok(User { id, username })
  }

  async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
    let username = input::required("username", username)?.to_owned();
    let password = input::required("password", password)?.to_owned();

    let user: Option<User> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, username FROM users WHERE username = ?1 AND password = ?2",
            rusqlite::params![username, password],
            |row| Ok(User { id: row.get(0)?, username: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;

    Ok(user.ok_or(CoreError::AuthError)?)
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let username = username.to_owned();

    Ok(self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, username FROM users WHERE username = ?1",
            rusqlite::params![username],
            |row| Ok(User { id: row.get(0)?, username: row.get(1)? }),
          )
          .optional()?)
      })
      .await?)
  }

  // ── Calendar Registry ─────────────────────────────────────────────────────

  async fn create_calendar(
    &self,
    session: &Session,
    name: &str,
    visibility: Visibility,
  ) -> Result<Calendar> {
    let name = input::required("calendar name", name)?.to_owned();
    let owner_id = session.user_id();

    let name_col = name.clone();
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO calendars (owner_id, name, visibility) VALUES (?1, ?2, ?3)",
          rusqlite::params![owner_id, name_col, encode_visibility(visibility)],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    info!(calendar_id = id, owner_id, %visibility, "created calendar");
    Ok(Calendar { id, owner_id, name, visibility })
  }

  async fn get_calendar(&self, calendar_id: i64) -> Result<Option<Calendar>> {
    let raw: Option<RawCalendar> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM calendars WHERE id = ?1", RawCalendar::COLUMNS),
            rusqlite::params![calendar_id],
            RawCalendar::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCalendar::into_calendar).transpose()
  }

  async fn owned_calendars(&self, session: &Session) -> Result<Vec<Calendar>> {
    let owner_id = session.user_id();

    let raws: Vec<RawCalendar> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM calendars WHERE owner_id = ?1",
          RawCalendar::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_id], RawCalendar::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut calendars: Vec<Calendar> = raws
      .into_iter()
      .map(RawCalendar::into_calendar)
      .collect::<Result<_>>()?;
    calendars.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
    Ok(calendars)
  }

  async fn set_visibility(
    &self,
    session: &Session,
    calendar_id: i64,
    visibility: Visibility,
  ) -> Result<Calendar> {
    let calendar = self.owned_calendar(session, calendar_id).await?;
    let owner_id = calendar.owner_id;

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE calendars SET visibility = ?1 WHERE id = ?2 AND owner_id = ?3",
          rusqlite::params![encode_visibility(visibility), calendar_id, owner_id],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(CoreError::CalendarNotFound(calendar_id).into());
    }
    info!(calendar_id, %visibility, "changed calendar visibility");
    Ok(Calendar { visibility, ..calendar })
  }

  async fn toggle_visibility(&self, session: &Session, calendar_id: i64) -> Result<Calendar> {
    let calendar = self.owned_calendar(session, calendar_id).await?;
    self
      .set_visibility(session, calendar_id, calendar.visibility.flipped())
      .await
  }

  async fn share_calendar(
    &self,
    session: &Session,
    calendar_id: i64,
    username: &str,
  ) -> Result<ShareOutcome> {
    let username = input::required("username", username)?;
    self.owned_calendar(session, calendar_id).await?;
    let target = self
      .find_user(username)
      .await?
      .ok_or_else(|| CoreError::UserNotFound(username.to_owned()))?;

    let target_id = target.id;
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO calendar_shares (calendar_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![calendar_id, target_id],
        )?)
      })
      .await?;

    if inserted == 0 {
      debug!(calendar_id, user_id = target_id, "calendar already shared");
      return Ok(ShareOutcome::AlreadyShared);
    }
    info!(calendar_id, user_id = target_id, "shared calendar");
    Ok(ShareOutcome::Shared)
  }

  async fn delete_calendar(&self, session: &Session, calendar_id: i64) -> Result<DeletedCalendar> {
    let calendar = self.owned_calendar(session, calendar_id).await?;
    let owner_id = calendar.owner_id;

    let removed: Option<(usize, usize)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let events = tx.execute(
          "DELETE FROM events WHERE calendar_id = ?1",
          rusqlite::params![calendar_id],
        )?;
        let shares = tx.execute(
          "DELETE FROM calendar_shares WHERE calendar_id = ?1",
          rusqlite::params![calendar_id],
        )?;
        let calendars = tx.execute(
          "DELETE FROM calendars WHERE id = ?1 AND owner_id = ?2",
          rusqlite::params![calendar_id, owner_id],
        )?;
        if calendars == 0 {
          // Dropping the transaction rolls the cascade back.
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some((events, shares)))
      })
      .await?;

    let (events_removed, shares_removed) =
      removed.ok_or(CoreError::CalendarNotFound(calendar_id))?;
    info!(calendar_id, events_removed, shares_removed, "deleted calendar");
    Ok(DeletedCalendar { calendar_id, events_removed, shares_removed })
  }

  async fn ensure_default_calendar(&self, user_id: i64) -> Result<Option<Calendar>> {
    let created: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let owns_any: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM calendars WHERE owner_id = ?1)",
          rusqlite::params![user_id],
          |row| row.get(0),
        )?;
        if owns_any {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO calendars (owner_id, name, visibility) VALUES (?1, ?2, ?3)",
          rusqlite::params![
            user_id,
            DEFAULT_CALENDAR_NAME,
            encode_visibility(Visibility::Private)
          ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    Ok(created.map(|id| {
      info!(calendar_id = id, user_id, "created default calendar");
      Calendar {
        id,
        owner_id: user_id,
        name: DEFAULT_CALENDAR_NAME.to_owned(),
        visibility: Visibility::Private,
      }
    }))
  }

  // ── Access Controller ─────────────────────────────────────────────────────

  async fn visible_calendars(&self, session: &Session) -> Result<Vec<VisibleCalendar>> {
    let user_id = session.user_id();

    let rows: Vec<VisibleCalendar> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(VISIBLE_CALENDARS)?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], |row| {
            Ok(VisibleCalendar { id: row.get(0)?, name: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(user_id, count = rows.len(), "computed visible calendars");
    Ok(access::collate_visible(rows))
  }

  // ── Event Ledger ──────────────────────────────────────────────────────────

  async fn add_event(
    &self,
    session: &Session,
    calendar_id: i64,
    date: NaiveDate,
    description: &str,
  ) -> Result<Event> {
    let description = input::required("description", description)?.to_owned();
    let visible = self.visible_calendars(session).await?;
    access::select_target_calendar(&visible, calendar_id)?;

    let user_id = session.user_id();
    let date_str = encode_date(date);
    let desc_col = description.clone();
    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          INSERT_VISIBLE_EVENT,
          rusqlite::params![user_id, date_str, desc_col, calendar_id],
        )?;
        Ok((inserted > 0).then(|| conn.last_insert_rowid()))
      })
      .await?;

    // Access may have been withdrawn between the check and the insert.
    let id = id.ok_or(CoreError::AccessDenied)?;
    info!(event_id = id, calendar_id, user_id, %date, "added event");
    Ok(Event { id, user_id, date, description, calendar_id })
  }

  async fn get_event(&self, event_id: i64) -> Result<Option<Event>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM events WHERE id = ?1", RawEvent::COLUMNS),
            rusqlite::params![event_id],
            RawEvent::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn events_on_date(&self, session: &Session, date: NaiveDate) -> Result<Vec<EventListing>> {
    let user_id = session.user_id();
    let date_str = encode_date(date);

    let raws: Vec<RawListing> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(EVENTS_ON_DATE)?;
        let rows = stmt
          .query_map(rusqlite::params![user_id, date_str], RawListing::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut listings: Vec<EventListing> = raws
      .into_iter()
      .map(RawListing::into_listing)
      .collect::<Result<_>>()?;
    access::order_listings(&mut listings);
    debug!(user_id, %date, count = listings.len(), "listed events");
    Ok(listings)
  }

  async fn update_event(&self, session: &Session, event_id: i64, description: &str) -> Result<Event> {
    let description = input::required("description", description)?.to_owned();
    let event = self.authored_event(session, event_id).await?;

    let user_id = event.user_id;
    let desc_col = description.clone();
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE events SET description = ?1 WHERE id = ?2 AND user_id = ?3",
          rusqlite::params![desc_col, event_id, user_id],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(CoreError::EventNotFound(event_id).into());
    }
    info!(event_id, user_id, "updated event");
    Ok(Event { description, ..event })
  }

  async fn delete_event(&self, session: &Session, event_id: i64) -> Result<()> {
    let event = self.authored_event(session, event_id).await?;

    let user_id = event.user_id;
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM events WHERE id = ?1 AND user_id = ?2",
          rusqlite::params![event_id, user_id],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(CoreError::EventNotFound(event_id).into());
    }
    info!(event_id, user_id, "deleted event");
    Ok(())
  }
}
