//! Join plan construction.
//!
//! The planner tags every include with a loading strategy and decides the
//! SQL shape of the root query. Plan nodes live in one flat vector indexed by
//! id; ids are assigned in preorder and the root is node `0`.
//!
//! A *query unit* is one statement rooted at an entity type: the root query,
//! or one include loaded by a separate query. A unit's *layout* is its head
//! plus every inline descendant reachable without crossing another separate
//! include; the layout is what one result row carries.

use std::fmt;

use compact_str::CompactString;

use crate::config::Config;
use crate::error::{PlaitError, Result};
use crate::expr::Predicate;
use crate::include::{IncludeNode, IncludeTree, OrderKey};
use crate::plait_trace_plan;
use crate::registry::{Association, Cardinality};
use crate::schema::EntityType;

/// How an include is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Joined into its parent's statement.
    InlineJoin,
    /// Loaded by a follow-up query keyed by parent ids.
    SeparateQuery,
}

/// SQL shape of the root query unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootShape {
    /// One statement; `LIMIT`/`OFFSET` apply to it directly.
    Single,
    /// Phase one selects the paginated root ids, phase two hydrates them.
    TwoPhase,
}

#[derive(Debug, Clone)]
pub struct PlanNode<'r> {
    pub id: usize,
    pub parent: Option<usize>,
    /// Dotted path from the root type; also the column label prefix
    pub path: CompactString,
    /// Key of the association in assembled results (root: the entity name)
    pub name: CompactString,
    /// `None` for the root
    pub association: Option<&'r Association>,
    pub entity: &'r EntityType,
    pub required: bool,
    pub filter: Option<Predicate>,
    pub order: Vec<OrderKey>,
    pub strategy: Strategy,
    pub children: Vec<usize>,
}

impl PlanNode<'_> {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Cardinality as seen from the parent. The root set counts as many.
    pub fn cardinality(&self) -> Cardinality {
        self.association
            .map_or(Cardinality::Many, |association| association.cardinality())
    }
}

/// The executable plan for one `find_all` call.
#[derive(Debug, Clone)]
pub struct JoinPlan<'r> {
    nodes: Vec<PlanNode<'r>>,
    pub shape: RootShape,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl<'r> JoinPlan<'r> {
    pub fn build(tree: IncludeTree<'r>, config: &Config) -> Result<Self> {
        let mut nodes = vec![PlanNode {
            id: 0,
            parent: None,
            path: tree.root.name().into(),
            name: tree.root.name().into(),
            association: None,
            entity: tree.root,
            required: false,
            filter: tree.filter,
            order: tree.order,
            strategy: Strategy::InlineJoin,
            children: Vec::new(),
        }];
        for child in tree.children {
            push_node(&mut nodes, 0, child, config)?;
        }

        let mut plan = JoinPlan {
            nodes,
            shape: RootShape::Single,
            limit: tree.limit,
            offset: tree.offset,
        };

        if plan.is_paginated() {
            plan.check_order_paths()?;
            let fans_out = plan
                .layout(0)
                .into_iter()
                .skip(1)
                .any(|id| plan.nodes[id].cardinality() == Cardinality::Many);
            if fans_out {
                plan.shape = RootShape::TwoPhase;
            }
        }

        plait_trace_plan!(plan.root().name, plan.shape, plan.units().len());
        Ok(plan)
    }

    pub fn root(&self) -> &PlanNode<'r> {
        &self.nodes[0]
    }

    pub fn node(&self, id: usize) -> &PlanNode<'r> {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[PlanNode<'r>] {
        &self.nodes
    }

    pub fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }

    /// Heads of all query units: the root, then separate includes breadth-first.
    pub fn units(&self) -> Vec<usize> {
        let mut units = vec![0];
        let mut cursor = 0;
        while cursor < units.len() {
            let head = units[cursor];
            cursor += 1;
            for id in self.layout(head) {
                units.extend(
                    self.nodes[id]
                        .children
                        .iter()
                        .copied()
                        .filter(|c| self.nodes[*c].strategy == Strategy::SeparateQuery),
                );
            }
        }
        units
    }

    /// The unit headed by `head` in preorder. Position `i` gets alias `t{i}`.
    pub fn layout(&self, head: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_layout(head, &mut out);
        out
    }

    fn collect_layout(&self, id: usize, out: &mut Vec<usize>) {
        out.push(id);
        for &child in &self.nodes[id].children {
            if self.nodes[child].strategy == Strategy::InlineJoin {
                self.collect_layout(child, out);
            }
        }
    }

    pub(crate) fn required_children(&self, id: usize) -> impl Iterator<Item = &PlanNode<'r>> {
        self.nodes[id]
            .children
            .iter()
            .map(|c| &self.nodes[*c])
            .filter(|c| c.required)
    }

    /// Follows a root order key's path through the included nodes.
    pub(crate) fn order_path(&self, key: &OrderKey) -> Vec<usize> {
        let mut out = Vec::with_capacity(key.path.len());
        let mut current = 0;
        for segment in &key.path {
            match self.nodes[current]
                .children
                .iter()
                .find(|c| self.nodes[**c].name == *segment)
            {
                Some(&id) => {
                    out.push(id);
                    current = id;
                }
                None => break,
            }
        }
        out
    }

    fn check_order_paths(&self) -> Result<()> {
        for key in &self.root().order {
            for id in self.order_path(key) {
                let node = &self.nodes[id];
                if node.strategy == Strategy::SeparateQuery {
                    return Err(PlaitError::unsupported(
                        &node.path,
                        "a paginated query cannot order by an include loaded by a separate query; \
                         mark it `separate(false)` or drop the pagination",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn push_node<'r>(
    nodes: &mut Vec<PlanNode<'r>>,
    parent: usize,
    node: IncludeNode<'r>,
    config: &Config,
) -> Result<()> {
    let strategy = match (node.required, node.separate) {
        (true, Some(true)) => {
            return Err(PlaitError::unsupported(
                &node.path,
                "a required include must be joined to constrain its parent, it cannot be loaded separately",
            ));
        }
        (true, _) | (false, Some(false)) => Strategy::InlineJoin,
        (false, Some(true)) => Strategy::SeparateQuery,
        (false, None)
            if config.separate_collections
                && node.association.cardinality() == Cardinality::Many =>
        {
            Strategy::SeparateQuery
        }
        (false, None) => Strategy::InlineJoin,
    };

    let id = nodes.len();
    nodes.push(PlanNode {
        id,
        parent: Some(parent),
        name: node.association.name.clone(),
        path: node.path,
        association: Some(node.association),
        entity: node.entity,
        required: node.required,
        filter: node.filter,
        order: node.order,
        strategy,
        children: Vec::new(),
    });
    nodes[parent].children.push(id);

    for child in node.children {
        push_node(nodes, id, child, config)?;
    }
    Ok(())
}

impl fmt::Display for JoinPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root();
        write!(f, "{}", root.name)?;
        match self.shape {
            RootShape::Single => f.write_str(" [single")?,
            RootShape::TwoPhase => f.write_str(" [two-phase")?,
        }
        if let Some(limit) = self.limit {
            write!(f, ", limit {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, ", offset {offset}")?;
        }
        f.write_str("]\n")?;
        for &child in &root.children {
            self.fmt_node(f, child, 1)?;
        }
        Ok(())
    }
}

impl JoinPlan<'_> {
    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, id: usize, depth: usize) -> fmt::Result {
        let node = &self.nodes[id];
        let cardinality = match node.cardinality() {
            Cardinality::One => "one",
            Cardinality::Many => "many",
        };
        let strategy = match node.strategy {
            Strategy::InlineJoin => "inline",
            Strategy::SeparateQuery => "separate",
        };
        write!(f, "{:indent$}{} ({cardinality}, {strategy}", "", node.name, indent = depth * 2)?;
        if node.required {
            f.write_str(", required")?;
        }
        if node.filter.is_some() {
            f.write_str(", filtered")?;
        }
        f.write_str(")\n")?;
        for &child in &node.children {
            self.fmt_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}
