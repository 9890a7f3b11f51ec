//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use skycal_core::{
  Error as CoreError, access,
  calendar::{DEFAULT_CALENDAR_NAME, ShareOutcome, Visibility},
  store::CalendarStore,
  user::{Session, register_and_sign_in, sign_in},
};

use crate::{Error, SqliteStore, schema::SCHEMA_VERSION};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn signed_up(s: &SqliteStore, username: &str) -> Session {
  register_and_sign_in(s, username, "secret")
    .await
    .expect("register and sign in")
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn domain(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

// ─── Credential Store ────────────────────────────────────────────────────────

#[tokio::test]
async fn register_then_authenticate() {
  let s = store().await;

  let user = s.register("alice", "secret").await.unwrap();
  assert_eq!(user.username, "alice");

  let authed = s.authenticate("alice", "secret").await.unwrap();
  assert_eq!(authed, user);
}

#[tokio::test]
async fn register_trims_credentials() {
  let s = store().await;

  let user = s.register("  alice ", " secret ").await.unwrap();
  assert_eq!(user.username, "alice");
  assert!(s.authenticate("alice", "secret").await.is_ok());
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  s.register("alice", "one").await.unwrap();

  let err = s.register("alice", "two").await.unwrap_err();
  assert_eq!(domain(err), CoreError::DuplicateUser("alice".into()));
}

#[tokio::test]
async fn usernames_are_case_sensitive() {
  let s = store().await;
  let lower = s.register("alice", "one").await.unwrap();
  let upper = s.register("Alice", "two").await.unwrap();
  assert_ne!(lower.id, upper.id);

  let err = s.authenticate("ALICE", "one").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AuthError);
}

#[tokio::test]
async fn wrong_password_is_auth_error() {
  let s = store().await;
  s.register("alice", "secret").await.unwrap();

  let err = s.authenticate("alice", "guess").await.unwrap_err();
  assert!(err.is_user_facing());
  assert_eq!(domain(err), CoreError::AuthError);

  let err = sign_in(&s, "nobody", "secret").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AuthError);
}

#[tokio::test]
async fn blank_credentials_are_invalid_input() {
  let s = store().await;

  let err = s.register("   ", "secret").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("username"));

  let err = s.register("alice", "").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("password"));

  let err = s.authenticate("", "secret").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("username"));
}

#[tokio::test]
async fn find_user_by_exact_name() {
  let s = store().await;
  let alice = s.register("alice", "secret").await.unwrap();

  assert_eq!(s.find_user("alice").await.unwrap(), Some(alice));
  assert_eq!(s.find_user("bob").await.unwrap(), None);
}

// ─── Default calendar ────────────────────────────────────────────────────────

#[tokio::test]
async fn first_login_creates_private_default_calendar() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  let owned = s.owned_calendars(&alice).await.unwrap();
  assert_eq!(owned.len(), 1);
  assert_eq!(owned[0].name, DEFAULT_CALENDAR_NAME);
  assert_eq!(owned[0].visibility, Visibility::Private);
  assert_eq!(owned[0].owner_id, alice.user_id());

  let visible = s.visible_calendars(&alice).await.unwrap();
  assert!(!visible.is_empty());
}

#[tokio::test]
async fn default_calendar_is_created_once() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  sign_in(&s, "alice", "secret").await.unwrap();
  sign_in(&s, "alice", "secret").await.unwrap();
  assert!(s.ensure_default_calendar(alice.user_id()).await.unwrap().is_none());

  assert_eq!(s.owned_calendars(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn no_default_when_user_already_owns_a_calendar() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let default = s.owned_calendars(&alice).await.unwrap().remove(0);
  s.create_calendar(&alice, "Work", Visibility::Private).await.unwrap();
  s.delete_calendar(&alice, default.id).await.unwrap();

  sign_in(&s, "alice", "secret").await.unwrap();

  let names: Vec<_> = s
    .owned_calendars(&alice)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, vec!["Work"]);
}

// ─── Visible calendars ───────────────────────────────────────────────────────

#[tokio::test]
async fn public_calendar_is_visible_to_every_user() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let carol = signed_up(&s, "carol").await;

  let team = s.create_calendar(&alice, "Team", Visibility::Public).await.unwrap();

  for session in [&alice, &bob, &carol] {
    let visible = s.visible_calendars(session).await.unwrap();
    assert!(visible.iter().any(|c| c.id == team.id));
  }
}

#[tokio::test]
async fn private_calendar_is_visible_to_owner_and_shares_only() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let carol = signed_up(&s, "carol").await;

  let family = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();
  let outcome = s.share_calendar(&alice, family.id, "bob").await.unwrap();
  assert_eq!(outcome, ShareOutcome::Shared);

  let sees = |v: &[skycal_core::calendar::VisibleCalendar]| v.iter().any(|c| c.id == family.id);
  assert!(sees(&s.visible_calendars(&alice).await.unwrap()));
  assert!(sees(&s.visible_calendars(&bob).await.unwrap()));
  assert!(!sees(&s.visible_calendars(&carol).await.unwrap()));
}

#[tokio::test]
async fn visible_calendars_are_deduplicated_and_ordered_by_name() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;

  // Public and shared at once: must appear a single time.
  let zoo = s.create_calendar(&alice, "zoo trips", Visibility::Public).await.unwrap();
  s.share_calendar(&alice, zoo.id, "bob").await.unwrap();
  let apple = s.create_calendar(&bob, "Apple", Visibility::Private).await.unwrap();
  let books = s.create_calendar(&alice, "books", Visibility::Public).await.unwrap();

  let names: Vec<_> = s
    .visible_calendars(&bob)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.name)
    .collect();
  assert_eq!(names, vec!["Apple", "books", "Private", "zoo trips"]);

  let ids: Vec<_> = s.visible_calendars(&bob).await.unwrap().into_iter().map(|c| c.id).collect();
  assert!(ids.contains(&apple.id) && ids.contains(&books.id));
  assert_eq!(ids.iter().filter(|id| **id == zoo.id).count(), 1);
}

#[tokio::test]
async fn visibility_change_is_seen_on_next_call() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;

  let notes = s.create_calendar(&alice, "Notes", Visibility::Private).await.unwrap();
  let sees = |v: Vec<skycal_core::calendar::VisibleCalendar>| v.iter().any(|c| c.id == notes.id);
  assert!(!sees(s.visible_calendars(&bob).await.unwrap()));

  let flipped = s.toggle_visibility(&alice, notes.id).await.unwrap();
  assert_eq!(flipped.visibility, Visibility::Public);
  assert!(sees(s.visible_calendars(&bob).await.unwrap()));

  s.set_visibility(&alice, notes.id, Visibility::Private).await.unwrap();
  assert!(!sees(s.visible_calendars(&bob).await.unwrap()));
}

// ─── Calendar Registry ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_calendar_trims_and_rejects_blank_names() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  let cal = s.create_calendar(&alice, "  Gym ", Visibility::Private).await.unwrap();
  assert_eq!(cal.name, "Gym");
  assert_eq!(s.get_calendar(cal.id).await.unwrap(), Some(cal));

  let err = s.create_calendar(&alice, " ", Visibility::Public).await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("calendar name"));
}

#[tokio::test]
async fn calendar_names_need_not_be_unique() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  let a = s.create_calendar(&alice, "Work", Visibility::Private).await.unwrap();
  let b = s.create_calendar(&alice, "Work", Visibility::Public).await.unwrap();
  assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn only_the_owner_manages_a_calendar() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  signed_up(&s, "carol").await;

  let team = s.create_calendar(&alice, "Team", Visibility::Public).await.unwrap();

  let err = s.set_visibility(&bob, team.id, Visibility::Private).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
  let err = s.toggle_visibility(&bob, team.id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
  let err = s.share_calendar(&bob, team.id, "carol").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
  let err = s.delete_calendar(&bob, team.id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);

  assert_eq!(s.get_calendar(team.id).await.unwrap().unwrap().visibility, Visibility::Public);
}

#[tokio::test]
async fn missing_calendar_is_reported() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  let err = s.toggle_visibility(&alice, 999).await.unwrap_err();
  assert_eq!(domain(err), CoreError::CalendarNotFound(999));
  assert!(s.get_calendar(999).await.unwrap().is_none());
}

#[tokio::test]
async fn sharing_twice_is_reported_not_raised() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  signed_up(&s, "bob").await;
  let cal = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();

  assert_eq!(s.share_calendar(&alice, cal.id, "bob").await.unwrap(), ShareOutcome::Shared);
  assert_eq!(
    s.share_calendar(&alice, cal.id, "bob").await.unwrap(),
    ShareOutcome::AlreadyShared
  );
}

#[tokio::test]
async fn sharing_with_unknown_user_fails() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let cal = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();

  let err = s.share_calendar(&alice, cal.id, "ghost").await.unwrap_err();
  assert_eq!(domain(err), CoreError::UserNotFound("ghost".into()));

  let err = s.share_calendar(&alice, cal.id, "  ").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("username"));
}

// ─── Delete cascade ──────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_a_calendar_removes_its_events_and_shares() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date = day(2024, 3, 1);
  let default = s.owned_calendars(&alice).await.unwrap().remove(0);

  let cal = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();
  s.share_calendar(&alice, cal.id, "bob").await.unwrap();
  let mine = s.add_event(&alice, cal.id, date, "Dinner").await.unwrap();
  let theirs = s.add_event(&bob, cal.id, date, "Bring cake").await.unwrap();
  let kept = s.add_event(&alice, default.id, date, "Gym").await.unwrap();

  let deleted = s.delete_calendar(&alice, cal.id).await.unwrap();
  assert_eq!(deleted.events_removed, 2);
  assert_eq!(deleted.shares_removed, 1);

  assert!(s.get_calendar(cal.id).await.unwrap().is_none());
  assert!(s.get_event(mine.id).await.unwrap().is_none());
  assert!(s.get_event(theirs.id).await.unwrap().is_none());
  assert!(s.get_event(kept.id).await.unwrap().is_some());

  assert!(s.events_on_date(&bob, date).await.unwrap().is_empty());
  assert!(!s.visible_calendars(&bob).await.unwrap().iter().any(|c| c.id == cal.id));

  let shares: i64 = s
    .conn
    .call(move |conn| {
      Ok(conn.query_row(
        "SELECT COUNT(*) FROM calendar_shares WHERE calendar_id = ?1",
        [cal.id],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(shares, 0);
}

#[tokio::test]
async fn failed_cascade_leaves_everything_in_place() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date = day(2024, 3, 1);

  let cal = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();
  s.share_calendar(&alice, cal.id, "bob").await.unwrap();
  let event = s.add_event(&alice, cal.id, date, "Dinner").await.unwrap();

  // Make the final step of the cascade fail after events and shares are gone.
  s.conn
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER pin_calendars BEFORE DELETE ON calendars
         BEGIN SELECT RAISE(ABORT, 'calendar is pinned'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.delete_calendar(&alice, cal.id).await.unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  assert!(!err.is_user_facing());

  assert!(s.get_calendar(cal.id).await.unwrap().is_some());
  assert_eq!(s.get_event(event.id).await.unwrap(), Some(event));
  let listed = s.events_on_date(&bob, date).await.unwrap();
  assert_eq!(listed.len(), 1, "share and event must survive the rollback");
}

// ─── Event Ledger ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_list_update_delete_roundtrip() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let cal = s.owned_calendars(&alice).await.unwrap().remove(0);
  let date = day(2024, 3, 1);

  let event = s.add_event(&alice, cal.id, date, "  Dentist ").await.unwrap();
  assert_eq!(event.description, "Dentist");
  assert_eq!(event.user_id, alice.user_id());

  let listed = s.events_on_date(&alice, date).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].event, event);
  assert_eq!(listed[0].to_string(), "[Private] (alice) Dentist");

  let updated = s.update_event(&alice, event.id, "Dentist at 9").await.unwrap();
  assert_eq!(updated.description, "Dentist at 9");
  let listed = s.events_on_date(&alice, date).await.unwrap();
  assert_eq!(listed[0].event.description, "Dentist at 9");

  s.delete_event(&alice, event.id).await.unwrap();
  assert!(s.events_on_date(&alice, date).await.unwrap().is_empty());
}

#[tokio::test]
async fn events_are_filtered_by_date() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let cal = s.owned_calendars(&alice).await.unwrap().remove(0);

  s.add_event(&alice, cal.id, day(2024, 3, 1), "First").await.unwrap();
  s.add_event(&alice, cal.id, day(2024, 3, 2), "Second").await.unwrap();

  let listed = s.events_on_date(&alice, day(2024, 3, 2)).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].event.description, "Second");
  assert!(s.events_on_date(&alice, day(2024, 3, 3)).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_description_is_invalid_input() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let cal = s.owned_calendars(&alice).await.unwrap().remove(0);
  let date = day(2024, 3, 1);

  let err = s.add_event(&alice, cal.id, date, " \n").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("description"));

  let event = s.add_event(&alice, cal.id, date, "Gym").await.unwrap();
  let err = s.update_event(&alice, event.id, "").await.unwrap_err();
  assert_eq!(domain(err), CoreError::InvalidInput("description"));
  assert_eq!(s.get_event(event.id).await.unwrap().unwrap().description, "Gym");
}

#[tokio::test]
async fn cannot_post_to_an_invisible_calendar() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let secret = s.create_calendar(&alice, "Secret", Visibility::Private).await.unwrap();

  let err = s.add_event(&bob, secret.id, day(2024, 3, 1), "Snoop").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);

  let err = s.add_event(&bob, 4242, day(2024, 3, 1), "Nowhere").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
}

#[tokio::test]
async fn shared_user_can_post_but_not_edit_others_events() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date = day(2024, 3, 1);

  let cal = s.create_calendar(&alice, "Family", Visibility::Private).await.unwrap();
  s.share_calendar(&alice, cal.id, "bob").await.unwrap();

  let alices = s.add_event(&alice, cal.id, date, "Dinner").await.unwrap();
  let bobs = s.add_event(&bob, cal.id, date, "Bring cake").await.unwrap();

  let err = s.update_event(&bob, alices.id, "Pizza").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
  let err = s.delete_event(&bob, alices.id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);

  // Owning the calendar grants nothing over Bob's event either.
  let err = s.update_event(&alice, bobs.id, "No cake").await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);
  let err = s.delete_event(&alice, bobs.id).await.unwrap_err();
  assert_eq!(domain(err), CoreError::AccessDenied);

  s.update_event(&bob, bobs.id, "Bring two cakes").await.unwrap();
  let listed = s.events_on_date(&alice, date).await.unwrap();
  let descriptions: Vec<_> = listed.iter().map(|l| l.event.description.as_str()).collect();
  assert_eq!(descriptions, vec!["Dinner", "Bring two cakes"]);
}

#[tokio::test]
async fn editing_missing_event_is_not_found() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;

  let err = s.update_event(&alice, 77, "x").await.unwrap_err();
  assert_eq!(domain(err), CoreError::EventNotFound(77));
  let err = s.delete_event(&alice, 77).await.unwrap_err();
  assert_eq!(domain(err), CoreError::EventNotFound(77));
}

#[tokio::test]
async fn listing_groups_by_calendar_name_then_creation_order() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date = day(2024, 3, 1);

  let work = s.create_calendar(&alice, "work", Visibility::Public).await.unwrap();
  let band = s.create_calendar(&bob, "Band", Visibility::Public).await.unwrap();

  s.add_event(&alice, work.id, date, "w1").await.unwrap();
  s.add_event(&bob, band.id, date, "b1").await.unwrap();
  s.add_event(&bob, work.id, date, "w2").await.unwrap();
  s.add_event(&alice, band.id, date, "b2").await.unwrap();

  let listed: Vec<_> = s
    .events_on_date(&alice, date)
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.to_string())
    .collect();
  assert_eq!(
    listed,
    vec!["[Band] (bob) b1", "[Band] (alice) b2", "[work] (alice) w1", "[work] (bob) w2"]
  );
}

#[tokio::test]
async fn event_follows_calendar_access_not_authorship() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date = day(2024, 3, 1);

  let team = s.create_calendar(&alice, "Team", Visibility::Public).await.unwrap();
  let bobs = s.add_event(&bob, team.id, date, "Retro").await.unwrap();

  s.set_visibility(&alice, team.id, Visibility::Private).await.unwrap();
  assert!(s.events_on_date(&bob, date).await.unwrap().is_empty());
  // Still attached to the calendar, and still visible to the owner.
  assert_eq!(s.get_event(bobs.id).await.unwrap().unwrap().calendar_id, team.id);
  assert_eq!(s.events_on_date(&alice, date).await.unwrap().len(), 1);

  s.share_calendar(&alice, team.id, "bob").await.unwrap();
  let listed = s.events_on_date(&bob, date).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].event.id, bobs.id);
}

#[tokio::test]
async fn public_team_calendar_scenario() {
  let s = store().await;
  let alice = signed_up(&s, "alice").await;
  let bob = signed_up(&s, "bob").await;
  let date: NaiveDate = "2024-03-01".parse().unwrap();

  let team = s.create_calendar(&alice, "Team", Visibility::Public).await.unwrap();
  assert!(s.visible_calendars(&bob).await.unwrap().iter().any(|c| c.name == "Team"));

  s.add_event(&alice, team.id, date, "Standup").await.unwrap();

  let listed = s.events_on_date(&bob, date).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].to_string(), "[Team] (alice) Standup");
  assert!(!access::can_edit_event(&bob, &listed[0].event));
  assert!(access::can_edit_event(&alice, &listed[0].event));
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_store_keeps_data() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("skycal.db");

  let event_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let alice = signed_up(&s, "alice").await;
    let cal = s.owned_calendars(&alice).await.unwrap().remove(0);
    s.add_event(&alice, cal.id, day(2024, 3, 1), "Persisted").await.unwrap().id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let alice = sign_in(&s, "alice", "secret").await.unwrap();
  assert_eq!(s.owned_calendars(&alice).await.unwrap().len(), 1);
  assert_eq!(
    s.get_event(event_id).await.unwrap().unwrap().description,
    "Persisted"
  );

  let version: i64 = s
    .conn
    .call(|conn| Ok(crate::schema::user_version(conn)?))
    .await
    .unwrap();
  assert_eq!(version, SCHEMA_VERSION);
}

#[tokio::test]
async fn unversioned_store_gains_calendar_column() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.db");

  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT UNIQUE NOT NULL, password TEXT NOT NULL);
         CREATE TABLE events (id INTEGER PRIMARY KEY, user_id INTEGER, date TEXT NOT NULL, description TEXT NOT NULL);",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let has_column: bool = s
    .conn
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM pragma_table_info('events') WHERE name = 'calendar_id')",
        [],
        |row| row.get(0),
      )?)
    })
    .await
    .unwrap();
  assert!(has_column);

  let alice = signed_up(&s, "alice").await;
  let cal = s.owned_calendars(&alice).await.unwrap().remove(0);
  s.add_event(&alice, cal.id, day(2024, 3, 1), "After upgrade").await.unwrap();
  assert_eq!(s.events_on_date(&alice, day(2024, 3, 1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_events_move_into_their_authors_default_calendar() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.db");

  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT UNIQUE NOT NULL, password TEXT NOT NULL);
         CREATE TABLE events (id INTEGER PRIMARY KEY, user_id INTEGER, date TEXT NOT NULL, description TEXT NOT NULL);
         INSERT INTO users (id, username, password) VALUES (1, 'alice', 'secret');
         INSERT INTO events (id, user_id, date, description) VALUES (1, 1, '2024-03-01', 'Dentist');
         INSERT INTO events (id, user_id, date, description) VALUES (2, 1, '2024-03-01', 'Gym');
         INSERT INTO events (id, user_id, date, description) VALUES (3, 99, '2024-03-01', 'Orphan');",
      )
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let alice = sign_in(&s, "alice", "secret").await.unwrap();

  let owned = s.owned_calendars(&alice).await.unwrap();
  assert_eq!(owned.len(), 1, "sign-in must reuse the calendar the upgrade created");
  let private = &owned[0];
  assert_eq!(private.name, DEFAULT_CALENDAR_NAME);
  assert_eq!(private.visibility, Visibility::Private);

  let dentist = s.get_event(1).await.unwrap().unwrap();
  assert_eq!(dentist.calendar_id, private.id);
  assert_eq!(s.get_event(3).await.unwrap(), None);

  let listed: Vec<String> = s
    .events_on_date(&alice, day(2024, 3, 1))
    .await
    .unwrap()
    .into_iter()
    .map(|l| l.event.description)
    .collect();
  assert_eq!(listed, vec!["Dentist", "Gym"]);

  let edited = s.update_event(&alice, 1, "Dentist 9:00").await.unwrap();
  assert_eq!(edited.description, "Dentist 9:00");
  s.delete_event(&alice, 2).await.unwrap();
  assert_eq!(s.get_event(2).await.unwrap(), None);

  // Reopening finds the store current and changes nothing.
  drop(s);
  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.events_on_date(&alice, day(2024, 3, 1)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn newer_schema_version_is_refused() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("future.db");

  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
  }

  let err = SqliteStore::open(&path).await.err().unwrap();
  assert!(matches!(
    err,
    Error::UnsupportedSchema { found, supported } if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
  ));
}
