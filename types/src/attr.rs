use crate::Dialect;

/// Semantic type of an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AttrType {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
}

impl AttrType {
    /// Column type used in `CREATE TABLE` for the given dialect.
    ///
    /// MySQL cannot index unbounded `TEXT`, so textual columns there are
    /// rendered as `VARCHAR(255)`.
    #[must_use]
    pub const fn column_type(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (AttrType::Integer, Dialect::SQLite) => "INTEGER",
            (AttrType::Integer, _) => "BIGINT",
            (AttrType::Real, Dialect::SQLite) => "REAL",
            (AttrType::Real, Dialect::PostgreSQL) => "DOUBLE PRECISION",
            (AttrType::Real, Dialect::MySQL) => "DOUBLE",
            (AttrType::Text, Dialect::MySQL) => "VARCHAR(255)",
            (AttrType::Text, _) => "TEXT",
            (AttrType::Blob, Dialect::PostgreSQL) => "BYTEA",
            (AttrType::Blob, _) => "BLOB",
            (AttrType::Boolean, Dialect::SQLite) => "INTEGER",
            (AttrType::Boolean, _) => "BOOLEAN",
        }
    }
}
