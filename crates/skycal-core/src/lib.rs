//! Core types and trait definitions for skycal.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain model (users, calendars, shares, events), the access rules that
//! decide who may see, post to, and edit what, and the [`store::CalendarStore`]
//! trait implemented by storage backends.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod calendar;
pub mod error;
pub mod event;
pub mod input;
pub mod store;
pub mod user;

pub use error::{Error, Result};
