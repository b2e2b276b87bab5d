//! Association registry.
//!
//! Entity types and the associations between them are declared up front and
//! looked up by name at query time. Every registration also records the
//! inverse traversal: a one-to-many `Post -> Comment` makes `Comment -> Post`
//! resolvable as many-to-one, and many-to-many associations are symmetric.

use compact_str::{CompactString, ToCompactString, format_compact};
use hashbrown::HashMap;
use plait_types::AttrType;

use crate::error::{PlaitError, Result};
use crate::plait_trace_schema;
use crate::schema::EntityType;

/// Kind of a declared association, as seen from its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationKind {
    /// One-to-many; the foreign key lives on the target.
    HasMany,
    /// Many-to-one; the foreign key lives on the source.
    BelongsTo,
    /// Many-to-many through a join table.
    ManyToMany,
}

/// How many target entities one source entity can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

impl AssociationKind {
    pub const fn cardinality(&self) -> Cardinality {
        match self {
            AssociationKind::BelongsTo => Cardinality::One,
            AssociationKind::HasMany | AssociationKind::ManyToMany => Cardinality::Many,
        }
    }
}

/// Columns needed to build a join condition between parent and child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// `child.child_column = parent.parent_column`
    Direct {
        parent_column: CompactString,
        child_column: CompactString,
    },
    /// `join.parent_fk = parent.parent_key AND child.child_key = join.child_fk`
    Through {
        table: CompactString,
        parent_fk: CompactString,
        child_fk: CompactString,
        parent_key: CompactString,
        child_key: CompactString,
    },
}

impl Link {
    /// The parent attribute whose value identifies the related children.
    pub fn parent_attribute(&self) -> &str {
        match self {
            Link::Direct { parent_column, .. } => parent_column,
            Link::Through { parent_key, .. } => parent_key,
        }
    }
}

/// One traversable edge between two entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Key used to include the association and to name it in results
    pub name: CompactString,
    pub source: CompactString,
    pub target: CompactString,
    pub kind: AssociationKind,
    pub link: Link,
}

impl Association {
    pub fn cardinality(&self) -> Cardinality {
        self.kind.cardinality()
    }
}

/// A join table column referencing one side of a many-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinColumn {
    pub column: CompactString,
    pub ty: AttrType,
    pub references_table: CompactString,
    pub references_column: CompactString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    pub name: CompactString,
    pub columns: [JoinColumn; 2],
}

/// Optional overrides for [`Registry::register_with`].
#[derive(Debug, Clone, Default)]
pub struct AssociationOptions {
    /// Name of the source-to-target edge (defaults to the target name)
    pub alias: Option<CompactString>,
    /// Name of the target-to-source edge (defaults to the source name)
    pub inverse_alias: Option<CompactString>,
    /// Column referencing the source key (on the target or the join table)
    pub foreign_key: Option<CompactString>,
    /// Join table column referencing the target key (many-to-many only)
    pub other_key: Option<CompactString>,
}

impl AssociationOptions {
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn inverse_alias(mut self, alias: &str) -> Self {
        self.inverse_alias = Some(alias.into());
        self
    }

    pub fn foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn other_key(mut self, column: &str) -> Self {
        self.other_key = Some(column.into());
        self
    }
}

/// Default foreign key column: `{lowercase entity}_{primary key}`.
fn default_foreign_key(entity: &EntityType) -> CompactString {
    format_compact!(
        "{}_{}",
        entity.name().to_lowercase(),
        entity.primary_key().name
    )
}

/// Entity types and their associations.
///
/// ```
/// use plait_core::{AttrType, Cardinality, EntityType, Registry};
///
/// let mut registry = Registry::new();
/// registry.define(EntityType::new("Project", "name", AttrType::Text));
/// registry.define(EntityType::new("User", "name", AttrType::Text));
/// registry.belongs_to_many("Project", "User", "user_project").unwrap();
///
/// let forward = registry.resolve("Project", "User").unwrap();
/// let backward = registry.resolve("User", "Project").unwrap();
/// assert_eq!(forward.cardinality(), Cardinality::Many);
/// assert_eq!(backward.cardinality(), Cardinality::Many);
/// assert!(registry.resolve("User", "Task").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: HashMap<CompactString, EntityType>,
    declared: Vec<CompactString>,
    associations: HashMap<(CompactString, CompactString), Association>,
    join_tables: Vec<JoinTable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an entity type. A later declaration with the same name replaces
    /// it and keeps the foreign keys earlier associations added to it.
    pub fn define(&mut self, entity: EntityType) -> &mut Self {
        let name = entity.name().to_compact_string();
        plait_trace_schema!("define", name);
        if self.entities.insert(name.clone(), entity).is_none() {
            self.declared.push(name.clone());
        }

        let foreign_keys: Vec<(CompactString, AttrType)> = self
            .associations
            .values()
            .filter(|a| a.kind == AssociationKind::HasMany && a.target == name)
            .filter_map(|a| match &a.link {
                Link::Direct {
                    parent_column,
                    child_column,
                } => {
                    let parent = self.entities.get(&a.source)?;
                    let index = parent.attribute_index(parent_column)?;
                    Some((child_column.clone(), parent.attributes()[index].ty))
                }
                Link::Through { .. } => None,
            })
            .collect();
        if let Some(entity) = self.entities.get_mut(&name) {
            for (column, ty) in foreign_keys {
                entity.ensure_attribute(&column, ty);
            }
        }
        self
    }

    pub fn entity(&self, name: &str) -> Result<&EntityType> {
        self.entities
            .get(name)
            .ok_or_else(|| PlaitError::UnknownEntity(name.into()))
    }

    /// Entity types in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityType> {
        self.declared.iter().filter_map(|name| self.entities.get(name))
    }

    pub fn join_tables(&self) -> &[JoinTable] {
        &self.join_tables
    }

    /// Looks up the association named `target` on `source`.
    ///
    /// `target` is the association name, which is the target entity name
    /// unless an alias was given at registration.
    pub fn resolve(&self, source: &str, target: &str) -> Result<&Association> {
        self.associations
            .get(&(CompactString::new(source), CompactString::new(target)))
            .ok_or_else(|| PlaitError::UnknownAssociation {
                path: format_compact!("{source}.{target}"),
                entity: source.into(),
                target: target.into(),
            })
    }

    /// All associations traversable from `source`.
    pub fn associations_of<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Association> {
        self.associations
            .values()
            .filter(move |association| association.source == source)
    }

    /// Registers an association with default key names.
    pub fn register(
        &mut self,
        source: &str,
        target: &str,
        kind: AssociationKind,
        join_table: Option<&str>,
    ) -> Result<()> {
        self.register_with(source, target, kind, join_table, AssociationOptions::default())
    }

    /// `source` has many `target`; the foreign key is added to `target`.
    pub fn has_many(&mut self, source: &str, target: &str) -> Result<()> {
        self.register(source, target, AssociationKind::HasMany, None)
    }

    /// `a` and `b` relate many-to-many through `through`.
    pub fn belongs_to_many(&mut self, a: &str, b: &str, through: &str) -> Result<()> {
        self.register(a, b, AssociationKind::ManyToMany, Some(through))
    }

    pub fn register_with(
        &mut self,
        source: &str,
        target: &str,
        kind: AssociationKind,
        join_table: Option<&str>,
        options: AssociationOptions,
    ) -> Result<()> {
        match (kind, join_table) {
            (AssociationKind::ManyToMany, None) => Err(PlaitError::Schema(format!(
                "many-to-many association `{source}` <-> `{target}` needs a join table"
            ))),
            (AssociationKind::ManyToMany, Some(table)) => {
                self.register_many_to_many(source, target, table, options)
            }
            (_, Some(table)) => Err(PlaitError::Schema(format!(
                "association `{source}` -> `{target}` is not many-to-many but names join table `{table}`"
            ))),
            (AssociationKind::HasMany, None) => self.register_one_to_many(source, target, options),
            (AssociationKind::BelongsTo, None) => {
                // The parent side owns the declaration; flip the aliases with it.
                let flipped = AssociationOptions {
                    alias: options.inverse_alias,
                    inverse_alias: options.alias,
                    foreign_key: options.foreign_key,
                    other_key: None,
                };
                self.register_one_to_many(target, source, flipped)
            }
        }
    }

    fn register_one_to_many(
        &mut self,
        parent: &str,
        child: &str,
        options: AssociationOptions,
    ) -> Result<()> {
        let parent_type = self.entity(parent)?;
        let parent_key = parent_type.primary_key().clone();
        let foreign_key = options
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(parent_type));
        self.entity(child)?;

        let forward = options.alias.unwrap_or_else(|| child.into());
        let backward = options.inverse_alias.unwrap_or_else(|| parent.into());
        if parent == child && forward == backward {
            return Err(PlaitError::Schema(format!(
                "`{parent}` -> `{child}` and its inverse are both named `{forward}`; give one an alias"
            )));
        }

        if let Some(child_type) = self.entities.get_mut(child) {
            child_type.ensure_attribute(&foreign_key, parent_key.ty);
        }

        self.insert(Association {
            name: forward,
            source: parent.into(),
            target: child.into(),
            kind: AssociationKind::HasMany,
            link: Link::Direct {
                parent_column: parent_key.name.clone(),
                child_column: foreign_key.clone(),
            },
        });
        self.insert(Association {
            name: backward,
            source: child.into(),
            target: parent.into(),
            kind: AssociationKind::BelongsTo,
            link: Link::Direct {
                parent_column: foreign_key,
                child_column: parent_key.name,
            },
        });
        Ok(())
    }

    fn register_many_to_many(
        &mut self,
        a: &str,
        b: &str,
        table: &str,
        options: AssociationOptions,
    ) -> Result<()> {
        let a_type = self.entity(a)?;
        let b_type = self.entity(b)?;
        let a_key = a_type.primary_key().clone();
        let b_key = b_type.primary_key().clone();
        let a_fk = options
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(a_type));
        let b_fk = options
            .other_key
            .unwrap_or_else(|| default_foreign_key(b_type));
        if a_fk == b_fk {
            return Err(PlaitError::Schema(format!(
                "join table `{table}` needs distinct key columns, both are `{a_fk}`"
            )));
        }

        let join_table = JoinTable {
            name: table.into(),
            columns: [
                JoinColumn {
                    column: a_fk.clone(),
                    ty: a_key.ty,
                    references_table: a_type.table_name().into(),
                    references_column: a_key.name.clone(),
                },
                JoinColumn {
                    column: b_fk.clone(),
                    ty: b_key.ty,
                    references_table: b_type.table_name().into(),
                    references_column: b_key.name.clone(),
                },
            ],
        };

        let forward = options.alias.unwrap_or_else(|| b.into());
        let backward = options.inverse_alias.unwrap_or_else(|| a.into());

        self.insert(Association {
            name: forward,
            source: a.into(),
            target: b.into(),
            kind: AssociationKind::ManyToMany,
            link: Link::Through {
                table: table.into(),
                parent_fk: a_fk.clone(),
                child_fk: b_fk.clone(),
                parent_key: a_key.name.clone(),
                child_key: b_key.name.clone(),
            },
        });
        self.insert(Association {
            name: backward,
            source: b.into(),
            target: a.into(),
            kind: AssociationKind::ManyToMany,
            link: Link::Through {
                table: table.into(),
                parent_fk: b_fk,
                child_fk: a_fk,
                parent_key: b_key.name,
                child_key: a_key.name,
            },
        });

        match self.join_tables.iter_mut().find(|t| t.name == table) {
            Some(existing) => *existing = join_table,
            None => self.join_tables.push(join_table),
        }
        Ok(())
    }

    fn insert(&mut self, association: Association) {
        plait_trace_schema!("associate", format_compact!("{}.{}", association.source, association.name));
        self.associations.insert(
            (association.source.clone(), association.name.clone()),
            association,
        );
    }
}
