//! SQLite backend for plait.
//!
//! # Features
//!
//! - `rusqlite` - [`SqliteBackend`] over a [`rusqlite::Connection`]
//! - `tracing` - forward statement tracing to `plait-core`

#[cfg(feature = "rusqlite")]
mod backend;
#[cfg(feature = "rusqlite")]
pub mod values;

#[cfg(feature = "rusqlite")]
pub use backend::SqliteBackend;

pub use plait_types::Dialect;

/// The dialect every backend in this crate renders for.
pub const DIALECT: Dialect = Dialect::SQLite;
