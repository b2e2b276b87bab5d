//! Entity type declarations.

use compact_str::CompactString;
use plait_types::AttrType;

/// A named, typed attribute of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: CompactString,
    pub ty: AttrType,
}

/// A named record type with a single-column primary key.
///
/// Attribute order is significant: it is the `SELECT` order and the order
/// attributes appear in assembled entities.
///
/// ```
/// use plait_core::{AttrType, EntityType};
///
/// let project = EntityType::new("Project", "name", AttrType::Text)
///     .with_table("projects")
///     .attribute("budget", AttrType::Integer);
///
/// assert_eq!(project.table_name(), "projects");
/// assert_eq!(project.primary_key().name, "name");
/// assert!(project.has_attribute("budget"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    name: CompactString,
    table: CompactString,
    primary_key: usize,
    attributes: Vec<Attribute>,
}

impl EntityType {
    /// Creates an entity type whose table name equals its name.
    pub fn new(name: &str, primary_key: &str, ty: AttrType) -> Self {
        Self {
            name: name.into(),
            table: name.into(),
            primary_key: 0,
            attributes: vec![Attribute {
                name: primary_key.into(),
                ty,
            }],
        }
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = table.into();
        self
    }

    /// Adds an attribute. Re-declaring an attribute replaces its type.
    pub fn attribute(mut self, name: &str, ty: AttrType) -> Self {
        match self.attribute_index(name) {
            Some(index) => self.attributes[index].ty = ty,
            None => self.attributes.push(Attribute {
                name: name.into(),
                ty,
            }),
        }
        self
    }

    /// Adds a foreign key column unless an attribute of that name exists.
    pub(crate) fn ensure_attribute(&mut self, name: &str, ty: AttrType) {
        if !self.has_attribute(name) {
            self.attributes.push(Attribute {
                name: name.into(),
                ty,
            });
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &Attribute {
        &self.attributes[self.primary_key]
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute_index(name).is_some()
    }
}
