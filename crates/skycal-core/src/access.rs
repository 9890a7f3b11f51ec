//! Access Controller rules.
//!
//! Calendar-level access (see, post) and event-level authorship (edit,
//! delete) are separate: being able to see a calendar never grants rights
//! over other users' events in it. The visible-calendar set itself is
//! computed by the store on every call; the helpers here only fix its order
//! and check membership.

use std::collections::HashSet;

use crate::{
  Error, Result,
  calendar::{Calendar, VisibleCalendar},
  event::{Event, EventListing},
  user::Session,
};

/// True iff the session user authored `event`. Calendar ownership and shares
/// play no part.
pub fn can_edit_event(session: &Session, event: &Event) -> bool {
  event.user_id == session.user_id()
}

/// True iff the session user owns `calendar`.
pub fn can_manage_calendar(session: &Session, calendar: &Calendar) -> bool {
  calendar.owner_id == session.user_id()
}

pub fn require_event_author(session: &Session, event: &Event) -> Result<()> {
  if can_edit_event(session, event) {
    Ok(())
  } else {
    Err(Error::AccessDenied)
  }
}

pub fn require_calendar_owner(session: &Session, calendar: &Calendar) -> Result<()> {
  if can_manage_calendar(session, calendar) {
    Ok(())
  } else {
    Err(Error::AccessDenied)
  }
}

/// Validate an explicitly selected target calendar against the visible set.
///
/// Never falls back to another calendar: an empty set is
/// [`Error::NoAccessibleCalendar`], an unknown id is [`Error::AccessDenied`].
pub fn select_target_calendar(
  visible: &[VisibleCalendar],
  calendar_id: i64,
) -> Result<&VisibleCalendar> {
  if visible.is_empty() {
    return Err(Error::NoAccessibleCalendar);
  }
  visible
    .iter()
    .find(|c| c.id == calendar_id)
    .ok_or(Error::AccessDenied)
}

/// Deduplicate by id and order by name, case-insensitively, then by id.
pub fn collate_visible(rows: Vec<VisibleCalendar>) -> Vec<VisibleCalendar> {
  let mut seen = HashSet::new();
  let mut out: Vec<VisibleCalendar> =
    rows.into_iter().filter(|c| seen.insert(c.id)).collect();
  out.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
  out
}

/// Order a day listing: grouped by calendar name (case-insensitive), then by
/// event id so each group reads in creation order.
pub fn order_listings(listings: &mut [EventListing]) {
  listings.sort_by_cached_key(|l| {
    (l.calendar_name.to_lowercase(), l.event.calendar_id, l.event.id)
  });
}
