//! Shared type definitions for plait.
//!
//! This crate provides the dialect-agnostic primitives used across the plait
//! crates:
//!
//! - [`Dialect`] - Database dialect enum (SQLite, PostgreSQL, MySQL)
//! - [`Value`] - A single SQL value as bound into or read out of a statement
//! - [`AttrType`] - The semantic type of an entity attribute
//!
//! # Features
//!
//! - `serde` - Enable serde serialization of values and dialects

mod attr;
mod dialect;
mod value;

pub use attr::AttrType;
pub use dialect::{Dialect, DialectParseError};
pub use value::Value;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{AttrType, Dialect, Value};
}
