//! # courier-store
//!
//! SQLite persistence for the courier relay: the append-only message log,
//! the friendship graph, presence records, recent-chat bookmarks, and the
//! identities table consumed by search.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed helpers for every domain
//! model.  Callers serialize access themselves (the server guards the
//! handle with a mutex), which makes each helper atomic with respect to
//! concurrent channel loops.

pub mod database;
pub mod friends;
pub mod identities;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod presence;
pub mod recent;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
