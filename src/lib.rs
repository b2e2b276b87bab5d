//! # plait
//!
//! Eager-load query composition: nested includes, required (inner-join)
//! semantics, per-include filters and ordering, and `LIMIT`/`OFFSET` that
//! always count distinct root entities.
//!
//! ## Quick Start
//!
//! ```rust
//! # #[cfg(feature = "rusqlite")]
//! # fn main() -> plait::Result<()> {
//! use plait::prelude::*;
//! use plait::sqlite::SqliteBackend;
//!
//! let mut registry = Registry::new();
//! registry
//!     .define(EntityType::new("Project", "name", AttrType::Text))
//!     .define(EntityType::new("User", "name", AttrType::Text));
//! registry.belongs_to_many("Project", "User", "user_project")?;
//!
//! let db = Plait::new(SqliteBackend::open_in_memory()?, registry);
//! db.sync()?;
//! for name in ["alpha", "bravo", "charlie"] {
//!     db.insert("Project", &[("name", name.into())])?;
//! }
//! db.insert("User", &[("name", "Alice".into())])?;
//! db.link("User", "Alice", "Project", "alpha")?;
//! db.link("User", "Alice", "Project", "charlie")?;
//!
//! let projects = db.find_all(
//!     "Project",
//!     FindAll::new()
//!         .include(Include::new("User").r#where(eq("name", "Alice")))
//!         .order_by("name")
//!         .limit(1)
//!         .offset(1),
//! )?;
//! assert_eq!(projects.len(), 1);
//! assert_eq!(projects[0].get("name"), Some(&Value::from("charlie")));
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "rusqlite"))]
//! # fn main() {}
//! ```
//!
//! ## Backends
//!
//! | Database | Driver   | Feature Flag | Status |
//! |----------|----------|--------------|--------|
//! | SQLite   | rusqlite | `rusqlite`   | ✅     |
//!
//! Other stores plug in through [`Backend`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod plait;

pub use plait::Plait;

// =============================================================================
// Root-level exports
// =============================================================================

/// Result type for plait operations
pub use plait_core::error::Result;

/// Database dialect enum
pub use plait_types::Dialect;

pub use plait_core::{
    Backend, Config, Direction, Entity, EntityType, FindAll, Include, OrderKey, Registry, Related,
    RowSet, Statement, Value,
};

/// Error types
pub mod error {
    pub use plait_core::error::{BackendError, PlaitError};
    pub use plait_core::ConfigError;
}

/// Planner, executor and assembler internals.
pub mod core {
    pub use plait_core::{
        Assembler, Association, AssociationKind, AssociationOptions, Attribute, Cardinality,
        Executor, IncludeNode, IncludeTree, JoinColumn, JoinPlan, JoinTable, Link, PlanNode,
        RootShape, Strategy, find_all,
    };
    pub use plait_core::include::normalize;

    /// Attribute predicates for `where` clauses.
    ///
    /// ```rust
    /// use plait::core::expr::{and, eq, like};
    ///
    /// let filter = and([eq("name", "Alice"), like("email", "%@example.com")]);
    /// ```
    pub use plait_core::expr;
}

/// SQLite backend.
#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite {
    #[cfg(feature = "rusqlite")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rusqlite")))]
    pub use plait_sqlite::SqliteBackend;

    #[cfg(feature = "rusqlite")]
    pub use plait_sqlite::values;

    #[cfg(feature = "rusqlite")]
    pub use ::rusqlite;
}

/// Prelude - import this for registry declarations and queries.
pub mod prelude {
    pub use crate::Plait;
    pub use plait_core::prelude::*;
}
