//! Synchronous SQLite backend using [`rusqlite`].
//!
//! # Example
//!
//! ```no_run
//! use plait_core::{Backend, Statement};
//! use plait_sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), plait_core::BackendError> {
//! let backend = SqliteBackend::open_in_memory()?;
//! backend.execute(&Statement::new("CREATE TABLE t (x INTEGER)", Vec::new()))?;
//! let rows = backend.query(&Statement::new("SELECT x FROM t", Vec::new()))?;
//! assert!(rows.is_empty());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Instant;

use compact_str::CompactString;
use plait_core::{Backend, BackendError, RowSet, Statement};
use plait_types::Dialect;
use rusqlite::{Connection, ErrorCode, params_from_iter};

use crate::values::{SqliteParam, value_from_ref};

/// Virtual machine instructions between deadline checks.
const PROGRESS_STEPS: i32 = 1000;

/// A [`Backend`] over one rusqlite connection.
#[derive(Debug)]
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, BackendError> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }

    /// Runs `f` with a progress handler interrupting the statement once the
    /// statement's timeout has passed.
    fn guarded<T>(
        &self,
        statement: &Statement,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, BackendError> {
        let Some(timeout) = statement.timeout else {
            return Ok(f(&self.conn)?);
        };

        let deadline = Instant::now() + timeout;
        self.conn
            .progress_handler(PROGRESS_STEPS, Some(move || Instant::now() >= deadline));
        let result = f(&self.conn);
        self.conn.progress_handler(0, None::<fn() -> bool>);

        result.map_err(|e| {
            if e.sqlite_error_code() == Some(ErrorCode::OperationInterrupted) {
                BackendError::Timeout(timeout)
            } else {
                BackendError::from(e)
            }
        })
    }
}

impl Backend for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn query(&self, statement: &Statement) -> Result<RowSet, BackendError> {
        self.guarded(statement, |conn| {
            let mut stmt = conn.prepare(&statement.sql)?;
            let columns: Vec<CompactString> =
                stmt.column_names().into_iter().map(CompactString::from).collect();
            let width = columns.len();
            let mut out = RowSet::new(columns);

            let mut rows = stmt.query(params_from_iter(statement.params.iter().map(SqliteParam)))?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(value_from_ref(row.get_ref(i)?));
                }
                out.rows.push(values);
            }
            Ok(out)
        })
    }

    fn execute(&self, statement: &Statement) -> Result<usize, BackendError> {
        self.guarded(statement, |conn| {
            conn.execute(
                &statement.sql,
                params_from_iter(statement.params.iter().map(SqliteParam)),
            )
        })
    }
}
