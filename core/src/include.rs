//! Include specifications and their normalization.
//!
//! [`FindAll`] and [`Include`] are the user-facing query description. The
//! normalizer resolves every include against the [`Registry`], validates the
//! attributes its `where` and `order` clauses reference, and produces an
//! [`IncludeTree`] the planner consumes.

use compact_str::{CompactString, format_compact};
use smallvec::SmallVec;

use crate::config::Config;
use crate::error::{PlaitError, Result};
use crate::expr::Predicate;
use crate::registry::{Association, Registry};
use crate::schema::EntityType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub(crate) const fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One `ORDER BY` key: an attribute of the root, or of an included
/// association reached through `path`.
///
/// ```
/// use plait_core::{Direction, OrderKey};
///
/// let by_name: OrderKey = "name".into();
/// let newest_hobby = OrderKey::through(["User", "Hobby"], "name").desc();
/// assert_eq!(by_name.direction, Direction::Asc);
/// assert_eq!(newest_hobby.path.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub path: SmallVec<[CompactString; 2]>,
    pub attribute: CompactString,
    pub direction: Direction,
}

impl OrderKey {
    pub fn asc(attribute: &str) -> Self {
        Self {
            path: SmallVec::new(),
            attribute: attribute.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(mut self) -> Self {
        self.direction = Direction::Desc;
        self
    }

    /// Orders by an attribute of an included association.
    pub fn through<I, S>(path: I, attribute: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            path: path.into_iter().map(|s| s.as_ref().into()).collect(),
            attribute: attribute.into(),
            direction: Direction::Asc,
        }
    }

    fn describe(&self) -> CompactString {
        if self.path.is_empty() {
            self.attribute.clone()
        } else {
            format_compact!("{}.{}", self.path.join("."), self.attribute)
        }
    }
}

impl From<&str> for OrderKey {
    fn from(attribute: &str) -> Self {
        OrderKey::asc(attribute)
    }
}

impl From<(&str, Direction)> for OrderKey {
    fn from((attribute, direction): (&str, Direction)) -> Self {
        Self {
            direction,
            ..OrderKey::asc(attribute)
        }
    }
}

/// A nested association to load alongside its parent.
///
/// ```
/// use plait_core::Include;
/// use plait_core::expr::eq;
///
/// let include = Include::new("User")
///     .required(true)
///     .r#where(eq("name", "Alice"))
///     .include(Include::new("Hobby").required(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub(crate) association: CompactString,
    pub(crate) required: Option<bool>,
    pub(crate) filter: Option<Predicate>,
    pub(crate) order: Vec<OrderKey>,
    pub(crate) separate: Option<bool>,
    pub(crate) children: Vec<Include>,
}

impl Include {
    /// Includes the association named `association` (the target entity name
    /// unless the association was registered with an alias).
    pub fn new(association: &str) -> Self {
        Self {
            association: association.into(),
            required: None,
            filter: None,
            order: Vec::new(),
            separate: None,
            children: Vec::new(),
        }
    }

    /// Parents without a qualifying match are dropped.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn r#where(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Orders the loaded children; keys name attributes of the target.
    pub fn order_by(mut self, key: impl Into<OrderKey>) -> Self {
        self.order.push(key.into());
        self
    }

    /// Forces (`true`) or forbids (`false`) loading with a follow-up query.
    pub fn separate(mut self, separate: bool) -> Self {
        self.separate = Some(separate);
        self
    }

    pub fn include(mut self, child: Include) -> Self {
        self.children.push(child);
        self
    }
}

/// A `find_all` call description.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindAll {
    pub(crate) include: Vec<Include>,
    pub(crate) filter: Option<Predicate>,
    pub(crate) order: Vec<OrderKey>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include.push(include);
        self
    }

    pub fn r#where(mut self, predicate: Predicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn order_by(mut self, key: impl Into<OrderKey>) -> Self {
        self.order.push(key.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }
}

// =============================================================================
// Normalized tree
// =============================================================================

/// A validated include with its association resolved.
#[derive(Debug, Clone)]
pub struct IncludeNode<'r> {
    /// Dotted path from the root type, e.g. `Project.User.Hobby`
    pub path: CompactString,
    pub association: &'r Association,
    pub entity: &'r EntityType,
    /// Effective flag after applying `Config::where_implies_required`
    pub required: bool,
    pub filter: Option<Predicate>,
    pub order: Vec<OrderKey>,
    pub separate: Option<bool>,
    pub children: Vec<IncludeNode<'r>>,
}

impl IncludeNode<'_> {
    /// Name of the association in results.
    pub fn name(&self) -> &str {
        &self.association.name
    }
}

/// The root of a normalized `find_all` call.
#[derive(Debug, Clone)]
pub struct IncludeTree<'r> {
    pub root: &'r EntityType,
    pub filter: Option<Predicate>,
    pub order: Vec<OrderKey>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub children: Vec<IncludeNode<'r>>,
}

/// Resolves and validates `query` against `registry`.
pub fn normalize<'r>(
    registry: &'r Registry,
    root: &str,
    query: &FindAll,
    config: &Config,
) -> Result<IncludeTree<'r>> {
    let root_type = registry.entity(root)?;

    if let Some(filter) = &query.filter
        && let Some(name) = filter.unknown_attribute(root_type)
    {
        return Err(PlaitError::invalid(
            root,
            format!("where references unknown attribute `{name}`"),
        ));
    }

    let children = normalize_children(registry, root_type, root, &query.include, config)?;

    for key in &query.order {
        validate_root_order(root_type, root, &children, key)?;
    }

    Ok(IncludeTree {
        root: root_type,
        filter: query.filter.clone(),
        order: query.order.clone(),
        limit: query.limit,
        offset: query.offset,
        children,
    })
}

fn normalize_children<'r>(
    registry: &'r Registry,
    parent: &'r EntityType,
    parent_path: &str,
    includes: &[Include],
    config: &Config,
) -> Result<Vec<IncludeNode<'r>>> {
    let mut nodes: Vec<IncludeNode<'r>> = Vec::with_capacity(includes.len());

    for include in includes {
        let path = format_compact!("{parent_path}.{}", include.association);

        let association = registry
            .resolve(parent.name(), &include.association)
            .map_err(|_| PlaitError::UnknownAssociation {
                path: path.clone(),
                entity: parent.name().into(),
                target: include.association.clone(),
            })?;
        let entity = registry.entity(&association.target)?;

        if nodes.iter().any(|n| n.association.name == association.name) {
            return Err(PlaitError::invalid(&path, "association included twice"));
        }

        if let Some(filter) = &include.filter
            && let Some(name) = filter.unknown_attribute(entity)
        {
            return Err(PlaitError::invalid(
                &path,
                format!("where references unknown attribute `{name}` of `{}`", entity.name()),
            ));
        }

        for key in &include.order {
            if !key.path.is_empty() {
                return Err(PlaitError::invalid(
                    &path,
                    format!("include order `{}` must name an attribute of `{}`", key.describe(), entity.name()),
                ));
            }
            if !entity.has_attribute(&key.attribute) {
                return Err(PlaitError::invalid(
                    &path,
                    format!("order references unknown attribute `{}`", key.attribute),
                ));
            }
        }

        let required = include
            .required
            .unwrap_or(config.where_implies_required && include.filter.is_some());

        let children = normalize_children(registry, entity, &path, &include.children, config)?;

        nodes.push(IncludeNode {
            path,
            association,
            entity,
            required,
            filter: include.filter.clone(),
            order: include.order.clone(),
            separate: include.separate,
            children,
        });
    }

    Ok(nodes)
}

fn validate_root_order(
    root: &EntityType,
    root_path: &str,
    children: &[IncludeNode<'_>],
    key: &OrderKey,
) -> Result<()> {
    let mut entity = root;
    let mut level = children;
    for segment in &key.path {
        let Some(node) = level.iter().find(|n| n.name() == segment.as_str()) else {
            return Err(PlaitError::invalid(
                root_path,
                format!("order `{}` references `{segment}`, which is not included", key.describe()),
            ));
        };
        entity = node.entity;
        level = &node.children;
    }
    if !entity.has_attribute(&key.attribute) {
        return Err(PlaitError::invalid(
            root_path,
            format!("order `{}` references unknown attribute of `{}`", key.describe(), entity.name()),
        ));
    }
    Ok(())
}
