//! SQLite adapter for joinery
//!
//! Runs composed queries through a [`rusqlite::Connection`] (feature `rusqlite`).

#[cfg(feature = "rusqlite")]
mod connection;

#[cfg(feature = "rusqlite")]
pub use connection::SqliteAdapter;

pub use joinery_core::{Adapter, Row, Value};
