//! Attribute predicates for `where` clauses.
//!
//! Predicates name attributes of the entity they filter; the renderer
//! qualifies them with whatever table alias that entity has in the statement
//! being built.
//!
//! ```
//! use plait_core::expr::*;
//!
//! let filter = and([eq("name", "Alice"), not(like("email", "%@example.com"))]);
//! assert_eq!(filter.attributes(), vec!["name", "email"]);
//! ```

use compact_str::CompactString;
use plait_types::Value;

use crate::schema::EntityType;
use crate::sql::SqlWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    const fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::Ne => " <> ",
            CompareOp::Gt => " > ",
            CompareOp::Gte => " >= ",
            CompareOp::Lt => " < ",
            CompareOp::Lte => " <= ",
        }
    }
}

/// A boolean condition over the attributes of one entity type.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        attribute: CompactString,
        op: CompareOp,
        value: Value,
    },
    Like {
        attribute: CompactString,
        pattern: String,
        negated: bool,
    },
    In {
        attribute: CompactString,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        attribute: CompactString,
        low: Value,
        high: Value,
    },
    Null {
        attribute: CompactString,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

fn compare(attribute: &str, op: CompareOp, value: impl Into<Value>) -> Predicate {
    Predicate::Compare {
        attribute: attribute.into(),
        op,
        value: value.into(),
    }
}

/// Equality comparison (`=`). Comparing with `NULL` renders `IS NULL`.
pub fn eq(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Eq, value)
}

/// Inequality comparison (`<>`). Comparing with `NULL` renders `IS NOT NULL`.
pub fn neq(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Ne, value)
}

pub fn gt(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Gt, value)
}

pub fn gte(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Gte, value)
}

pub fn lt(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Lt, value)
}

pub fn lte(attribute: &str, value: impl Into<Value>) -> Predicate {
    compare(attribute, CompareOp::Lte, value)
}

/// Pattern match (`LIKE`).
pub fn like(attribute: &str, pattern: impl Into<String>) -> Predicate {
    Predicate::Like {
        attribute: attribute.into(),
        pattern: pattern.into(),
        negated: false,
    }
}

pub fn not_like(attribute: &str, pattern: impl Into<String>) -> Predicate {
    Predicate::Like {
        attribute: attribute.into(),
        pattern: pattern.into(),
        negated: true,
    }
}

/// Set membership (`IN`). An empty set matches nothing.
pub fn in_array<I, V>(attribute: &str, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::In {
        attribute: attribute.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: false,
    }
}

/// Set exclusion (`NOT IN`). An empty set matches everything.
pub fn not_in_array<I, V>(attribute: &str, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Predicate::In {
        attribute: attribute.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: true,
    }
}

pub fn between(attribute: &str, low: impl Into<Value>, high: impl Into<Value>) -> Predicate {
    Predicate::Between {
        attribute: attribute.into(),
        low: low.into(),
        high: high.into(),
    }
}

pub fn is_null(attribute: &str) -> Predicate {
    Predicate::Null {
        attribute: attribute.into(),
        negated: false,
    }
}

pub fn is_not_null(attribute: &str) -> Predicate {
    Predicate::Null {
        attribute: attribute.into(),
        negated: true,
    }
}

/// Conjunction. An empty conjunction is always true.
pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::And(predicates.into_iter().collect())
}

/// Disjunction. An empty disjunction is always false.
pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Or(predicates.into_iter().collect())
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate::Not(Box::new(predicate))
}

impl Predicate {
    /// Attribute names referenced by this predicate, in first-use order.
    pub fn attributes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_attributes(&mut out);
        out
    }

    fn collect_attributes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { attribute, .. }
            | Predicate::Like { attribute, .. }
            | Predicate::In { attribute, .. }
            | Predicate::Between { attribute, .. }
            | Predicate::Null { attribute, .. } => {
                if !out.contains(&attribute.as_str()) {
                    out.push(attribute);
                }
            }
            Predicate::And(items) | Predicate::Or(items) => {
                for item in items {
                    item.collect_attributes(out);
                }
            }
            Predicate::Not(inner) => inner.collect_attributes(out),
        }
    }

    /// The first referenced attribute `entity` does not declare.
    pub fn unknown_attribute(&self, entity: &EntityType) -> Option<&str> {
        self.attributes()
            .into_iter()
            .find(|name| !entity.has_attribute(name))
    }

    /// Renders the predicate against the table aliased `alias`.
    pub(crate) fn render(&self, alias: &str, w: &mut SqlWriter) {
        match self {
            Predicate::Compare {
                attribute,
                op,
                value,
            } => {
                w.column(alias, attribute);
                match (op, value) {
                    (CompareOp::Eq, Value::Null) => w.push(" IS NULL"),
                    (CompareOp::Ne, Value::Null) => w.push(" IS NOT NULL"),
                    _ => {
                        w.push(op.as_sql());
                        w.bind(value.clone());
                    }
                }
            }
            Predicate::Like {
                attribute,
                pattern,
                negated,
            } => {
                w.column(alias, attribute);
                w.push(if *negated { " NOT LIKE " } else { " LIKE " });
                w.bind(Value::Text(pattern.clone()));
            }
            Predicate::In {
                values, negated, ..
            } if values.is_empty() => {
                w.push(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Predicate::In {
                attribute,
                values,
                negated,
            } => {
                w.column(alias, attribute);
                w.push(if *negated { " NOT IN (" } else { " IN (" });
                w.bind_list(values.iter().cloned());
                w.push(")");
            }
            Predicate::Between {
                attribute,
                low,
                high,
            } => {
                w.column(alias, attribute);
                w.push(" BETWEEN ");
                w.bind(low.clone());
                w.push(" AND ");
                w.bind(high.clone());
            }
            Predicate::Null {
                attribute,
                negated,
            } => {
                w.column(alias, attribute);
                w.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(items) => render_joined(items, " AND ", "1 = 1", alias, w),
            Predicate::Or(items) => render_joined(items, " OR ", "1 = 0", alias, w),
            Predicate::Not(inner) => {
                w.push("NOT (");
                inner.render(alias, w);
                w.push(")");
            }
        }
    }
}

fn render_joined(items: &[Predicate], separator: &str, empty: &str, alias: &str, w: &mut SqlWriter) {
    if items.is_empty() {
        w.push(empty);
        return;
    }
    w.push("(");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            w.push(separator);
        }
        item.render(alias, w);
    }
    w.push(")");
}
