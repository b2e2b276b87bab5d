//! Row assembly.
//!
//! Flattened rows are folded into an arena of entity slots keyed by
//! `(parent slot, plan node, primary key)`, so a row repeated by join
//! fan-out lands on the slot it already created. The nested tree is only
//! materialized once every query unit has been absorbed.

use compact_str::CompactString;
use hashbrown::HashMap;
use plait_types::{AttrType, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::backend::RowSet;
use crate::error::{BackendError, Result};
use crate::plan::JoinPlan;
use crate::registry::Cardinality;
use crate::sql::{PARENT_LABEL, column_label};

/// An assembled entity with its loaded associations.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Entity type name
    pub entity: CompactString,
    /// Attribute values in declaration order
    pub attributes: Vec<(CompactString, Value)>,
    /// Loaded associations in include order
    pub associations: Vec<(CompactString, Related)>,
}

/// The loaded side of one association.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

impl Entity {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value)
    }

    pub fn related(&self, association: &str) -> Option<&Related> {
        self.associations
            .iter()
            .find(|(name, _)| name == association)
            .map(|(_, related)| related)
    }

    /// A loaded collection; empty when the association is single or absent.
    pub fn many(&self, association: &str) -> &[Entity] {
        match self.related(association) {
            Some(Related::Many(items)) => items,
            _ => &[],
        }
    }

    pub fn one(&self, association: &str) -> Option<&Entity> {
        match self.related(association) {
            Some(Related::One(item)) => item.as_deref(),
            _ => None,
        }
    }

    /// JSON object of attributes followed by associations.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + self.associations.len()))?;
        for (name, value) in &self.attributes {
            map.serialize_entry(name.as_str(), value)?;
        }
        for (name, related) in &self.associations {
            map.serialize_entry(name.as_str(), related)?;
        }
        map.end()
    }
}

impl Serialize for Related {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Related::One(item) => item.serialize(serializer),
            Related::Many(items) => items.serialize(serializer),
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug)]
struct Slot {
    node: usize,
    attributes: Vec<(CompactString, Value)>,
    /// Child slots per child plan node, in plan order
    children: Vec<(usize, Vec<usize>)>,
}

/// Column positions of one layout node within a row set.
#[derive(Debug)]
struct NodeColumns {
    node: usize,
    /// Layout position of the parent node, `None` for the unit head
    parent: Option<usize>,
    pk: usize,
    attributes: Vec<(CompactString, usize, AttrType)>,
}

/// Folds row sets of one plan into nested entities.
#[derive(Debug)]
pub struct Assembler<'p, 'r> {
    plan: &'p JoinPlan<'r>,
    slots: Vec<Slot>,
    index: HashMap<(Option<usize>, usize, Value), usize>,
    roots: Vec<usize>,
}

impl<'p, 'r> Assembler<'p, 'r> {
    pub fn new(plan: &'p JoinPlan<'r>) -> Self {
        Self {
            plan,
            slots: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Absorbs rows of the root unit.
    pub fn absorb_root(&mut self, rows: &RowSet) -> Result<()> {
        let columns = self.columns(0, rows)?;
        for row in &rows.rows {
            self.place(row, &columns, None);
        }
        Ok(())
    }

    /// Parent keys a separate unit must be queried for, distinct, in first
    /// seen order.
    pub fn parent_keys(&self, head: usize) -> Vec<Value> {
        let mut keys = Vec::new();
        let mut seen = hashbrown::HashSet::new();
        for (_, key) in self.parent_slots(head) {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
        keys
    }

    /// Absorbs rows of a separate unit, attaching each to every parent whose
    /// key matches its `__parent` column.
    pub fn absorb_separate(&mut self, head: usize, rows: &RowSet) -> Result<()> {
        let columns = self.columns(head, rows)?;
        let parent_column = rows
            .column_index(PARENT_LABEL)
            .ok_or_else(|| missing_column(PARENT_LABEL))?;
        let key_type = self.parent_key_type(head);

        let mut by_key: HashMap<Value, Vec<usize>> = HashMap::new();
        for (slot, key) in self.parent_slots(head) {
            by_key.entry(key.clone()).or_default().push(slot);
        }

        for row in &rows.rows {
            let key = row[parent_column].clone();
            let key = match key_type {
                Some(ty) => key.coerce(ty),
                None => key,
            };
            let Some(parents) = by_key.get(&key) else {
                continue;
            };
            for &parent in parents {
                self.place(row, &columns, Some(parent));
            }
        }
        Ok(())
    }

    /// Moves the roots into phase-one order. Roots missing from `ids` sort last.
    pub fn order_roots(&mut self, ids: &[Value]) {
        let position: HashMap<&Value, usize> =
            ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        let pk = self.plan.root().entity.primary_key_index();
        let slots = &self.slots;
        self.roots.sort_by_key(|&slot| {
            slots[slot]
                .attributes
                .get(pk)
                .and_then(|(_, value)| position.get(value).copied())
                .unwrap_or(usize::MAX)
        });
    }

    /// Materializes the nested result.
    pub fn finish(mut self) -> Vec<Entity> {
        let roots = std::mem::take(&mut self.roots);
        roots.into_iter().map(|slot| self.build(slot)).collect()
    }

    fn build(&mut self, slot: usize) -> Entity {
        let node = self.slots[slot].node;
        let attributes = std::mem::take(&mut self.slots[slot].attributes);
        let children = std::mem::take(&mut self.slots[slot].children);
        let plan = self.plan;

        let associations = children
            .into_iter()
            .map(|(child, slots)| {
                let child_node = plan.node(child);
                let mut entities = slots.into_iter().map(|s| self.build(s));
                let related = match child_node.cardinality() {
                    Cardinality::Many => Related::Many(entities.collect()),
                    Cardinality::One => Related::One(entities.next().map(Box::new)),
                };
                (child_node.name.clone(), related)
            })
            .collect();

        Entity {
            entity: plan.node(node).entity.name().into(),
            attributes,
            associations,
        }
    }

    fn columns(&self, head: usize, rows: &RowSet) -> Result<Vec<NodeColumns>> {
        let layout = self.plan.layout(head);
        let mut out = Vec::with_capacity(layout.len());
        for &id in &layout {
            let node = self.plan.node(id);
            let mut attributes = Vec::with_capacity(node.entity.attributes().len());
            for attribute in node.entity.attributes() {
                let label = column_label(node, &attribute.name);
                let index = rows
                    .column_index(&label)
                    .ok_or_else(|| missing_column(&label))?;
                attributes.push((attribute.name.clone(), index, attribute.ty));
            }
            out.push(NodeColumns {
                node: id,
                parent: node
                    .parent
                    .filter(|_| id != head)
                    .and_then(|p| layout.iter().position(|l| *l == p)),
                pk: attributes[node.entity.primary_key_index()].1,
                attributes,
            });
        }
        Ok(out)
    }

    /// Places one row: every layout node whose primary key is present and
    /// whose parent was placed gets (or reuses) a slot.
    fn place(&mut self, row: &[Value], columns: &[NodeColumns], head_parent: Option<usize>) {
        let mut placed: Vec<Option<usize>> = vec![None; columns.len()];
        for (position, node) in columns.iter().enumerate() {
            let parent = match node.parent {
                None => head_parent,
                Some(p) => match placed[p] {
                    Some(slot) => Some(slot),
                    None => continue,
                },
            };
            if row[node.pk].is_null() {
                continue;
            }
            placed[position] = Some(self.slot(row, node, parent));
        }
    }

    fn slot(&mut self, row: &[Value], columns: &NodeColumns, parent: Option<usize>) -> usize {
        let ty = columns
            .attributes
            .iter()
            .find(|(_, index, _)| *index == columns.pk)
            .map_or(AttrType::Text, |(_, _, ty)| *ty);
        let key = (parent, columns.node, row[columns.pk].clone().coerce(ty));
        if let Some(&slot) = self.index.get(&key) {
            return slot;
        }

        let id = self.slots.len();
        self.slots.push(Slot {
            node: columns.node,
            attributes: columns
                .attributes
                .iter()
                .map(|(name, index, ty)| (name.clone(), row[*index].clone().coerce(*ty)))
                .collect(),
            children: self
                .plan
                .node(columns.node)
                .children
                .iter()
                .map(|&child| (child, Vec::new()))
                .collect(),
        });
        self.index.insert(key, id);

        match parent {
            Some(parent) => {
                if let Some((_, list)) = self.slots[parent]
                    .children
                    .iter_mut()
                    .find(|(child, _)| *child == columns.node)
                {
                    list.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    /// Slots of the separate unit's parent node with their non-null link keys.
    fn parent_slots(&self, head: usize) -> impl Iterator<Item = (usize, &Value)> {
        let node = self.plan.node(head);
        let parent = node.parent.unwrap_or(0);
        let attribute = node.association.map(|a| a.link.parent_attribute());
        let index = attribute.and_then(|a| self.plan.node(parent).entity.attribute_index(a));

        self.slots
            .iter()
            .enumerate()
            .filter(move |(_, slot)| slot.node == parent)
            .filter_map(move |(i, slot)| {
                let (_, value) = slot.attributes.get(index?)?;
                (!value.is_null()).then_some((i, value))
            })
    }

    fn parent_key_type(&self, head: usize) -> Option<AttrType> {
        let node = self.plan.node(head);
        let parent = self.plan.node(node.parent?);
        let attribute = node.association?.link.parent_attribute();
        let index = parent.entity.attribute_index(attribute)?;
        Some(parent.entity.attributes()[index].ty)
    }
}

fn missing_column(label: &str) -> BackendError {
    BackendError::Query(format!("result is missing column `{label}`"))
}
