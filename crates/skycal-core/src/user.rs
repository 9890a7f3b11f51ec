//! Users and the explicit session value threaded through every call.

use serde::{Deserialize, Serialize};

use crate::store::CalendarStore;

/// A registered user. Immutable once created; never deleted.
///
/// The password is persisted by the store but never handed back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       i64,
  /// Unique, compared case-sensitively.
  pub username: String,
}

/// The signed-in user on whose behalf an operation runs.
///
/// Passed explicitly to every access-controlled store method instead of
/// being read from ambient state, so several sessions can coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  user: User,
}

impl Session {
  pub fn new(user: User) -> Self { Self { user } }

  pub fn user(&self) -> &User { &self.user }

  pub fn user_id(&self) -> i64 { self.user.id }

  pub fn username(&self) -> &str { &self.user.username }
}

/// Log in: check the credential pair, then make sure the user owns at least
/// one calendar.
pub async fn sign_in<S: CalendarStore>(
  store: &S,
  username: &str,
  password: &str,
) -> Result<Session, S::Error> {
  let user = store.authenticate(username, password).await?;
  store.ensure_default_calendar(user.id).await?;
  Ok(Session::new(user))
}

/// Register a new account and immediately sign it in.
pub async fn register_and_sign_in<S: CalendarStore>(
  store: &S,
  username: &str,
  password: &str,
) -> Result<Session, S::Error> {
  store.register(username, password).await?;
  sign_in(store, username, password).await
}
