//! Validation for free-text fields entered by users.

use crate::{Error, Result};

/// Trim `value` and reject it if nothing remains.
///
/// `field` names the input in the resulting [`Error::InvalidInput`].
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidInput(field));
  }
  Ok(trimmed)
}
