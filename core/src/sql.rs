//! SQL rendering for join plans.
//!
//! Every statement is written in one pass into a [`SqlWriter`], which keeps
//! the text and the bind parameters in placeholder order. Inline nodes of a
//! unit are aliased `t{position}`; `EXISTS` and ordering subqueries use
//! scratch aliases `e{n}` / `j{n}` so they never collide with the outer
//! statement.

use core::fmt::Write;

use compact_str::{CompactString, format_compact};
use plait_types::{Dialect, Value};

use crate::backend::Statement;
use crate::include::{Direction, OrderKey};
use crate::plan::{JoinPlan, PlanNode, RootShape};
use crate::registry::Link;

/// Column label carrying the parent key in separate-query results.
pub const PARENT_LABEL: &str = "__parent";

/// Column exposing the parent foreign key of a many-to-many derived table.
const THROUGH_FK: &str = "__plait_fk";

/// Accumulates SQL text and bind parameters.
#[derive(Debug)]
pub(crate) struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    scratch: usize,
}

impl SqlWriter {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::with_capacity(256),
            params: Vec::new(),
            scratch: 0,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    /// Quotes an identifier, doubling embedded quote characters.
    pub(crate) fn ident(&mut self, name: &str) {
        let quote = self.dialect.identifier_quote();
        self.sql.push(quote);
        for c in name.chars() {
            if c == quote {
                self.sql.push(quote);
            }
            self.sql.push(c);
        }
        self.sql.push(quote);
    }

    /// `"alias"."column"`
    pub(crate) fn column(&mut self, alias: &str, column: &str) {
        self.ident(alias);
        self.sql.push('.');
        self.ident(column);
    }

    /// `"table" AS "alias"`
    fn table(&mut self, table: &str, alias: &str) {
        self.ident(table);
        self.sql.push_str(" AS ");
        self.ident(alias);
    }

    pub(crate) fn bind(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    /// Comma separated placeholders for every value.
    pub(crate) fn bind_list(&mut self, values: impl IntoIterator<Item = Value>) {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.bind(value);
        }
    }

    /// Fresh alias number for a subquery.
    fn scratch(&mut self) -> usize {
        self.scratch += 1;
        self.scratch
    }

    /// Pushes ` WHERE ` for the first condition of a clause and ` AND ` after.
    fn conjunction(&mut self, first: &mut bool) {
        self.sql.push_str(if *first { " WHERE " } else { " AND " });
        *first = false;
    }

    fn limit_offset(&mut self, limit: Option<u64>, offset: Option<u64>) {
        // SQLite and PostgreSQL take signed 64-bit bounds; a larger limit
        // cannot cut anything off.
        let dialect = self.dialect;
        let in_range = |n: u64| dialect == Dialect::MySQL || n <= i64::MAX as u64;
        let limit = limit.filter(|n| in_range(*n));
        let offset = offset.map(|n| if in_range(n) { n } else { i64::MAX as u64 });
        match (limit, offset) {
            (Some(n), _) => {
                let _ = write!(self.sql, " LIMIT {n}");
            }
            // SQLite and MySQL have no OFFSET without LIMIT.
            (None, Some(_)) => match self.dialect {
                Dialect::SQLite => self.sql.push_str(" LIMIT -1"),
                Dialect::MySQL => self.sql.push_str(" LIMIT 18446744073709551615"),
                Dialect::PostgreSQL => {}
            },
            (None, None) => {}
        }
        if let Some(n) = offset {
            let _ = write!(self.sql, " OFFSET {n}");
        }
    }

    pub(crate) fn finish(self) -> Statement {
        Statement::new(self.sql, self.params)
    }
}

/// Column label of an attribute of a plan node: `Project.User.name`.
pub fn column_label(node: &PlanNode<'_>, attribute: &str) -> CompactString {
    format_compact!("{}.{}", node.path, attribute)
}

fn inline_alias(position: usize) -> CompactString {
    format_compact!("t{position}")
}

impl JoinPlan<'_> {
    /// Phase one of a two-phase root query: the qualifying root keys in
    /// result order, paginated.
    pub fn render_root_ids(&self, dialect: Dialect) -> Statement {
        let root = self.root();
        let mut w = SqlWriter::new(dialect);
        w.push("SELECT ");
        w.column("t0", &root.entity.primary_key().name);
        w.push(" FROM ");
        w.table(root.entity.table_name(), "t0");
        self.write_root_conditions(&mut w);
        self.write_root_order(&mut w);
        w.limit_offset(self.limit, self.offset);
        w.finish()
    }

    /// The root unit's full select.
    ///
    /// With `ids` the statement hydrates exactly those roots and carries no
    /// pagination; without, it applies the root filter, the required
    /// constraints and the pagination itself.
    pub fn render_root(&self, dialect: Dialect, ids: Option<&[Value]>) -> Statement {
        let root = self.root();
        let layout = self.layout(0);
        let mut w = SqlWriter::new(dialect);
        w.push("SELECT ");
        self.write_select_list(&mut w, &layout);
        w.push(" FROM ");
        w.table(root.entity.table_name(), "t0");
        self.write_inline_joins(&mut w, &layout);

        match ids {
            Some(ids) => {
                w.push(" WHERE ");
                w.column("t0", &root.entity.primary_key().name);
                w.push(" IN (");
                w.bind_list(ids.iter().cloned());
                w.push(")");
                self.write_root_order(&mut w);
                self.write_child_order(&mut w, &layout);
            }
            None => {
                self.write_root_conditions(&mut w);
                self.write_root_order(&mut w);
                self.write_child_order(&mut w, &layout);
                w.limit_offset(self.limit, self.offset);
            }
        }
        w.finish()
    }

    /// A separate-query unit: children of the given parent keys, each row
    /// labelled with its parent key.
    pub fn render_separate(&self, head: usize, keys: &[Value], dialect: Dialect) -> Statement {
        let node = self.node(head);
        let layout = self.layout(head);
        let mut w = SqlWriter::new(dialect);
        w.push("SELECT ");

        match node.association.map(|a| &a.link) {
            Some(Link::Through {
                table,
                parent_fk,
                child_fk,
                child_key,
                ..
            }) => {
                w.column("j0", parent_fk);
                w.push(" AS ");
                w.ident(PARENT_LABEL);
                w.push(", ");
                self.write_select_list(&mut w, &layout);
                w.push(" FROM ");
                w.table(table, "j0");
                w.push(" INNER JOIN ");
                w.table(node.entity.table_name(), "t0");
                w.push(" ON ");
                w.column("t0", child_key);
                w.push(" = ");
                w.column("j0", child_fk);
                self.write_inline_joins(&mut w, &layout);
                w.push(" WHERE ");
                w.column("j0", parent_fk);
            }
            Some(Link::Direct { child_column, .. }) => {
                w.column("t0", child_column);
                w.push(" AS ");
                w.ident(PARENT_LABEL);
                w.push(", ");
                self.write_select_list(&mut w, &layout);
                w.push(" FROM ");
                w.table(node.entity.table_name(), "t0");
                self.write_inline_joins(&mut w, &layout);
                w.push(" WHERE ");
                w.column("t0", child_column);
            }
            None => {
                // The root is never a separate unit; render it plainly.
                return self.render_root(dialect, None);
            }
        }

        w.push(" IN (");
        w.bind_list(keys.iter().cloned());
        w.push(")");
        let mut first = false;
        self.write_node_conditions(&mut w, head, "t0", &mut first);
        self.write_child_order(&mut w, &layout);
        w.finish()
    }

    /// The statements a call starts with, for `explain`.
    pub fn render_entry(&self, dialect: Dialect) -> Statement {
        match self.shape {
            RootShape::Single => self.render_root(dialect, None),
            RootShape::TwoPhase => self.render_root_ids(dialect),
        }
    }

    fn write_select_list(&self, w: &mut SqlWriter, layout: &[usize]) {
        let mut first = true;
        for (position, &id) in layout.iter().enumerate() {
            let node = self.node(id);
            let alias = inline_alias(position);
            for attribute in node.entity.attributes() {
                if !first {
                    w.push(", ");
                }
                first = false;
                w.column(&alias, &attribute.name);
                w.push(" AS ");
                w.ident(&column_label(node, &attribute.name));
            }
        }
    }

    /// LEFT JOINs for every inline node after the head. The ON clause
    /// carries the node filter and its required constraints so only
    /// qualifying children attach.
    fn write_inline_joins(&self, w: &mut SqlWriter, layout: &[usize]) {
        for (position, &id) in layout.iter().enumerate().skip(1) {
            let node = self.node(id);
            let Some(association) = node.association else {
                continue;
            };
            let alias = inline_alias(position);
            let parent_alias = node
                .parent
                .and_then(|p| layout.iter().position(|l| *l == p))
                .map_or_else(|| inline_alias(0), inline_alias);

            w.push(" LEFT JOIN ");
            match &association.link {
                Link::Direct {
                    parent_column,
                    child_column,
                } => {
                    w.table(node.entity.table_name(), &alias);
                    w.push(" ON ");
                    w.column(&alias, child_column);
                    w.push(" = ");
                    w.column(&parent_alias, parent_column);
                }
                Link::Through {
                    table,
                    parent_fk,
                    child_fk,
                    parent_key,
                    child_key,
                } => {
                    w.push("(SELECT ");
                    w.column("j", parent_fk);
                    w.push(" AS ");
                    w.ident(THROUGH_FK);
                    w.push(", ");
                    w.ident("x");
                    w.push(".* FROM ");
                    w.table(table, "j");
                    w.push(" INNER JOIN ");
                    w.table(node.entity.table_name(), "x");
                    w.push(" ON ");
                    w.column("x", child_key);
                    w.push(" = ");
                    w.column("j", child_fk);
                    w.push(") AS ");
                    w.ident(&alias);
                    w.push(" ON ");
                    w.column(&alias, THROUGH_FK);
                    w.push(" = ");
                    w.column(&parent_alias, parent_key);
                }
            }
            let mut first = false;
            self.write_node_conditions(w, id, &alias, &mut first);
        }
    }

    /// Appends the node's filter and one `EXISTS` per required child, each
    /// introduced by `WHERE` or `AND` per `first`.
    fn write_node_conditions(&self, w: &mut SqlWriter, id: usize, alias: &str, first: &mut bool) {
        if let Some(filter) = &self.node(id).filter {
            w.conjunction(first);
            filter.render(alias, w);
        }
        for child in self.required_children(id) {
            w.conjunction(first);
            self.write_exists(w, child, alias);
        }
    }

    fn write_root_conditions(&self, w: &mut SqlWriter) {
        let mut first = true;
        self.write_node_conditions(w, 0, "t0", &mut first);
    }

    /// `EXISTS (SELECT 1 FROM child ... WHERE link AND filter AND nested)`
    fn write_exists(&self, w: &mut SqlWriter, node: &PlanNode<'_>, parent_alias: &str) {
        let Some(association) = node.association else {
            return;
        };
        let n = w.scratch();
        let alias = format_compact!("e{n}");
        w.push("EXISTS (SELECT 1 FROM ");
        match &association.link {
            Link::Direct {
                parent_column,
                child_column,
            } => {
                w.table(node.entity.table_name(), &alias);
                w.push(" WHERE ");
                w.column(&alias, child_column);
                w.push(" = ");
                w.column(parent_alias, parent_column);
            }
            Link::Through {
                table,
                parent_fk,
                child_fk,
                parent_key,
                child_key,
            } => {
                let join = format_compact!("j{n}");
                w.table(table, &join);
                w.push(" INNER JOIN ");
                w.table(node.entity.table_name(), &alias);
                w.push(" ON ");
                w.column(&alias, child_key);
                w.push(" = ");
                w.column(&join, child_fk);
                w.push(" WHERE ");
                w.column(&join, parent_fk);
                w.push(" = ");
                w.column(parent_alias, parent_key);
            }
        }
        let mut first = false;
        self.write_node_conditions(w, node.id, &alias, &mut first);
        w.push(")");
    }

    /// Root order keys, then the root primary key unless already a key.
    fn write_root_order(&self, w: &mut SqlWriter) {
        let root = self.root();
        let pk = &root.entity.primary_key().name;
        w.push(" ORDER BY ");
        for (i, key) in root.order.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            if key.path.is_empty() {
                w.column("t0", &key.attribute);
            } else {
                self.write_order_subquery(w, key);
            }
            w.push(" ");
            w.push(key.direction.as_sql());
        }
        if !root.order.iter().any(|k| k.path.is_empty() && k.attribute == *pk) {
            if !root.order.is_empty() {
                w.push(", ");
            }
            w.column("t0", pk);
            w.push(" ASC");
        }
    }

    /// Each inline child's order keys, then its primary key. Continues the
    /// root's `ORDER BY` in the root unit, starts one in a separate unit.
    fn write_child_order(&self, w: &mut SqlWriter, layout: &[usize]) {
        if !self.node(layout[0]).is_root() {
            w.push(" ORDER BY ");
        }
        for (position, &id) in layout.iter().enumerate() {
            let node = self.node(id);
            if node.is_root() {
                continue;
            }
            let alias = inline_alias(position);
            if position > 0 {
                w.push(", ");
            }
            for key in &node.order {
                w.column(&alias, &key.attribute);
                w.push(" ");
                w.push(key.direction.as_sql());
                w.push(", ");
            }
            w.column(&alias, &node.entity.primary_key().name);
            w.push(" ASC");
        }
    }

    /// Correlated scalar subquery over the qualifying children along the
    /// key's path: `MIN` ascending, `MAX` descending.
    fn write_order_subquery(&self, w: &mut SqlWriter, key: &OrderKey) {
        let path = self.order_path(key);
        let aggregate = match key.direction {
            Direction::Asc => "MIN",
            Direction::Desc => "MAX",
        };
        let numbers: Vec<usize> = path.iter().map(|_| w.scratch()).collect();
        let Some(&last) = numbers.last() else {
            w.column("t0", &key.attribute);
            return;
        };

        w.push("(SELECT ");
        w.push(aggregate);
        w.push("(");
        w.column(&format_compact!("e{last}"), &key.attribute);
        w.push(") FROM ");

        // Later steps join on their link; the first correlates in WHERE.
        let mut parent_alias = inline_alias(0);
        let mut correlation = None;
        for (step, (&id, &n)) in path.iter().zip(&numbers).enumerate() {
            let node = self.node(id);
            let Some(association) = node.association else {
                continue;
            };
            let alias = format_compact!("e{n}");
            let join = format_compact!("j{n}");
            if step > 0 {
                w.push(" INNER JOIN ");
            }
            match &association.link {
                Link::Direct {
                    parent_column,
                    child_column,
                } => {
                    w.table(node.entity.table_name(), &alias);
                    if step == 0 {
                        correlation = Some((alias.clone(), child_column, parent_column));
                    } else {
                        w.push(" ON ");
                        w.column(&alias, child_column);
                        w.push(" = ");
                        w.column(&parent_alias, parent_column);
                    }
                }
                Link::Through {
                    table,
                    parent_fk,
                    child_fk,
                    parent_key,
                    child_key,
                } => {
                    w.table(table, &join);
                    if step == 0 {
                        correlation = Some((join.clone(), parent_fk, parent_key));
                    } else {
                        w.push(" ON ");
                        w.column(&join, parent_fk);
                        w.push(" = ");
                        w.column(&parent_alias, parent_key);
                    }
                    w.push(" INNER JOIN ");
                    w.table(node.entity.table_name(), &alias);
                    w.push(" ON ");
                    w.column(&alias, child_key);
                    w.push(" = ");
                    w.column(&join, child_fk);
                }
            }
            if step > 0 {
                let mut first = false;
                self.write_node_conditions(w, id, &alias, &mut first);
            }
            parent_alias = alias;
        }

        if let Some((alias, column, root_column)) = correlation {
            w.push(" WHERE ");
            w.column(&alias, column);
            w.push(" = ");
            w.column(&inline_alias(0), root_column);
            let mut first = false;
            self.write_node_conditions(w, path[0], &format_compact!("e{}", numbers[0]), &mut first);
        }
        w.push(")");
    }
}
