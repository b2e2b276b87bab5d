//! Core of plait: eager-load query composition.
//!
//! A [`find_all`] call flows through five stages:
//!
//! 1. the [`Registry`] resolves association names into join metadata,
//! 2. [`include::normalize`] validates the include tree,
//! 3. [`JoinPlan::build`] picks a strategy per include and a root shape,
//! 4. the [`Executor`] renders and runs the statements over a [`Backend`],
//! 5. the [`Assembler`] folds flat rows into nested, deduplicated [`Entity`]s.
//!
//! Paginated queries whose joined includes fan out run in two phases: the
//! qualifying root keys are selected (ordered, limited) first, then hydrated
//! without a limit, so `LIMIT`/`OFFSET` always count distinct roots.

pub mod assemble;
pub mod backend;
pub mod config;
mod ddl;
pub mod error;
pub mod executor;
pub mod expr;
pub mod include;
pub mod plan;
pub mod registry;
pub mod schema;
pub mod sql;
pub mod tracing;

pub use assemble::{Assembler, Entity, Related};
pub use backend::{Backend, RowSet, Statement};
pub use config::{Config, ConfigError};
pub use error::{BackendError, PlaitError, Result};
pub use executor::{Executor, find_all};
pub use expr::Predicate;
pub use include::{Direction, FindAll, Include, IncludeNode, IncludeTree, OrderKey};
pub use plan::{JoinPlan, PlanNode, RootShape, Strategy};
pub use registry::{
    Association, AssociationKind, AssociationOptions, Cardinality, JoinColumn, JoinTable, Link,
    Registry,
};
pub use schema::{Attribute, EntityType};

pub use plait_types::{AttrType, Dialect, Value};

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::expr::*;
    pub use crate::{
        AssociationKind, AttrType, Backend, Config, Dialect, Direction, Entity, EntityType,
        FindAll, Include, OrderKey, PlaitError, Registry, Related, Value,
    };
}
