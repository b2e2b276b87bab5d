//! Storage backend abstraction.

use std::time::Duration;

use compact_str::CompactString;
use plait_types::{Dialect, Value};

use crate::error::BackendError;

/// A rendered statement with its bind parameters in placeholder order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    /// Deadline for the round trip, enforced by the backend when set
    pub timeout: Option<Duration>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Raw rows returned by a backend, labelled by the statement's column aliases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub columns: Vec<CompactString>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<CompactString>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Appends the rows of a later chunk of the same statement shape.
    pub fn extend(&mut self, other: RowSet) {
        if self.columns.is_empty() {
            self.columns = other.columns;
        }
        self.rows.extend(other.rows);
    }
}

/// Connection abstraction the executor runs statements through.
///
/// Implementations execute exactly what they are given: no retries, no
/// statement rewriting. Failures surface as [`BackendError`].
pub trait Backend {
    /// Dialect used to render statements for this backend
    fn dialect(&self) -> Dialect;

    /// Execute a query and return all rows
    fn query(&self, statement: &Statement) -> Result<RowSet, BackendError>;

    /// Execute a statement and return the number of affected rows
    fn execute(&self, statement: &Statement) -> Result<usize, BackendError>;
}

impl<B: Backend + ?Sized> Backend for &B {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn query(&self, statement: &Statement) -> Result<RowSet, BackendError> {
        (**self).query(statement)
    }

    fn execute(&self, statement: &Statement) -> Result<usize, BackendError> {
        (**self).execute(statement)
    }
}
