//! Table creation and seeding statements for a registry.
//!
//! This is a plain `CREATE TABLE` emitter used to stand a schema up from
//! scratch (tests, demos); it does not diff or alter existing tables.

use plait_types::{Dialect, Value};

use crate::backend::Statement;
use crate::error::{PlaitError, Result};
use crate::registry::{AssociationKind, Link, Registry};
use crate::schema::EntityType;
use crate::sql::SqlWriter;

impl Registry {
    /// `CREATE TABLE` for every entity type in declaration order, then every
    /// join table.
    pub fn create_statements(&self, dialect: Dialect) -> Vec<Statement> {
        let mut out = Vec::new();
        for entity in self.entities() {
            let mut w = SqlWriter::new(dialect);
            w.push("CREATE TABLE ");
            w.ident(entity.table_name());
            w.push(" (");
            for (i, attribute) in entity.attributes().iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.ident(&attribute.name);
                w.push(" ");
                w.push(attribute.ty.column_type(dialect));
                if i == entity.primary_key_index() {
                    w.push(" PRIMARY KEY");
                }
            }
            w.push(")");
            out.push(w.finish());
        }

        for table in self.join_tables() {
            let mut w = SqlWriter::new(dialect);
            w.push("CREATE TABLE ");
            w.ident(&table.name);
            w.push(" (");
            for column in &table.columns {
                w.ident(&column.column);
                w.push(" ");
                w.push(column.ty.column_type(dialect));
                w.push(" NOT NULL REFERENCES ");
                w.ident(&column.references_table);
                w.push(" (");
                w.ident(&column.references_column);
                w.push("), ");
            }
            w.push("PRIMARY KEY (");
            w.ident(&table.columns[0].column);
            w.push(", ");
            w.ident(&table.columns[1].column);
            w.push("))");
            out.push(w.finish());
        }
        out
    }

    /// `DROP TABLE IF EXISTS` in reverse dependency order.
    pub fn drop_statements(&self, dialect: Dialect) -> Vec<Statement> {
        let join_tables = self.join_tables().iter().map(|t| t.name.as_str());
        let entities: Vec<&str> = self.entities().map(EntityType::table_name).collect();
        join_tables
            .chain(entities.into_iter().rev())
            .map(|table| {
                let mut w = SqlWriter::new(dialect);
                w.push("DROP TABLE IF EXISTS ");
                w.ident(table);
                w.finish()
            })
            .collect()
    }

    /// `INSERT` of one entity. Every named attribute must be declared.
    pub fn insert_statement(
        &self,
        dialect: Dialect,
        entity: &str,
        values: &[(&str, Value)],
    ) -> Result<Statement> {
        let entity = self.entity(entity)?;
        if let Some((name, _)) = values.iter().find(|(name, _)| !entity.has_attribute(name)) {
            return Err(PlaitError::Schema(format!(
                "`{}` has no attribute `{name}`",
                entity.name()
            )));
        }

        let mut w = SqlWriter::new(dialect);
        w.push("INSERT INTO ");
        w.ident(entity.table_name());
        w.push(" (");
        for (i, (name, _)) in values.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.ident(name);
        }
        w.push(") VALUES (");
        w.bind_list(values.iter().map(|(_, value)| value.clone()));
        w.push(")");
        Ok(w.finish())
    }

    /// Relates two existing entities along the association `source.target`:
    /// sets the foreign key for one-to-many links, inserts a join row for
    /// many-to-many links.
    pub fn link_statement(
        &self,
        dialect: Dialect,
        source: &str,
        source_key: Value,
        target: &str,
        target_key: Value,
    ) -> Result<Statement> {
        let association = self.resolve(source, target)?;
        let mut w = SqlWriter::new(dialect);

        match (&association.link, association.kind) {
            (Link::Through { table, parent_fk, child_fk, .. }, _) => {
                w.push("INSERT INTO ");
                w.ident(table);
                w.push(" (");
                w.ident(parent_fk);
                w.push(", ");
                w.ident(child_fk);
                w.push(") VALUES (");
                w.bind(source_key);
                w.push(", ");
                w.bind(target_key);
                w.push(")");
            }
            (Link::Direct { child_column, .. }, AssociationKind::HasMany) => {
                let child = self.entity(&association.target)?;
                update(&mut w, child, child_column, source_key, target_key);
            }
            (Link::Direct { parent_column, .. }, _) => {
                let parent = self.entity(&association.source)?;
                update(&mut w, parent, parent_column, target_key, source_key);
            }
        }
        Ok(w.finish())
    }
}

/// `UPDATE entity SET column = value WHERE pk = key`
fn update(w: &mut SqlWriter, entity: &EntityType, column: &str, value: Value, key: Value) {
    w.push("UPDATE ");
    w.ident(entity.table_name());
    w.push(" SET ");
    w.ident(column);
    w.push(" = ");
    w.bind(value);
    w.push(" WHERE ");
    w.ident(&entity.primary_key().name);
    w.push(" = ");
    w.bind(key);
}
