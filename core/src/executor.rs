//! Query execution.
//!
//! Runs the statements of a [`JoinPlan`] through a [`Backend`] in order: the
//! root unit (one or two round trips, the hydrate chunked by
//! `max_bind_params`), then every separate unit breadth-first with the parent
//! keys gathered from what is already assembled.

use std::time::{Duration, Instant};

use plait_types::Value;

use crate::assemble::{Assembler, Entity};
use crate::backend::{Backend, RowSet, Statement};
use crate::config::Config;
use crate::error::{BackendError, Result};
use crate::include::{FindAll, normalize};
use crate::plait_trace_query;
use crate::plan::{JoinPlan, RootShape};
use crate::registry::Registry;

/// Normalizes, plans and runs one `find_all` call.
pub fn find_all<B: Backend>(
    registry: &Registry,
    backend: &B,
    config: &Config,
    root: &str,
    query: &FindAll,
) -> Result<Vec<Entity>> {
    let tree = normalize(registry, root, query, config)?;
    let plan = JoinPlan::build(tree, config)?;
    Executor::new(backend, config).run(&plan)
}

/// Executes plans against one backend handle.
#[derive(Debug)]
pub struct Executor<'a, B: Backend> {
    backend: &'a B,
    timeout: Option<Duration>,
    max_bind_params: usize,
}

impl<'a, B: Backend> Executor<'a, B> {
    pub fn new(backend: &'a B, config: &Config) -> Self {
        Self {
            backend,
            timeout: config.timeout(),
            max_bind_params: config.max_bind_params.max(1),
        }
    }

    pub fn run(&self, plan: &JoinPlan<'_>) -> Result<Vec<Entity>> {
        let dialect = self.backend.dialect();
        let mut assembler = Assembler::new(plan);

        match plan.shape {
            RootShape::Single => {
                let rows = self.query(plan.render_root(dialect, None))?;
                assembler.absorb_root(&rows)?;
            }
            RootShape::TwoPhase => {
                let ids = self.query(plan.render_root_ids(dialect))?;
                let ids: Vec<Value> = ids
                    .rows
                    .into_iter()
                    .filter_map(|row| row.into_iter().next())
                    .map(|id| id.coerce(plan.root().entity.primary_key().ty))
                    .collect();
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                let rows = self.chunked(&ids, |chunk| plan.render_root(dialect, Some(chunk)))?;
                assembler.absorb_root(&rows)?;
                assembler.order_roots(&ids);
            }
        }

        for head in plan.units().into_iter().skip(1) {
            let keys = assembler.parent_keys(head);
            if keys.is_empty() {
                continue;
            }
            let rows = self.chunked(&keys, |chunk| plan.render_separate(head, chunk, dialect))?;
            assembler.absorb_separate(head, &rows)?;
        }

        Ok(assembler.finish())
    }

    /// Runs `render` once per key chunk and concatenates the results.
    ///
    /// Filter parameters count against `max_bind_params` too; a chunk always
    /// carries at least one key.
    fn chunked(&self, keys: &[Value], render: impl Fn(&[Value]) -> Statement) -> Result<RowSet> {
        let fixed = render(&[]).params.len();
        let size = self.max_bind_params.saturating_sub(fixed).max(1);
        let mut out = RowSet::default();
        for chunk in keys.chunks(size) {
            out.extend(self.query(render(chunk))?);
        }
        Ok(out)
    }

    fn query(&self, statement: Statement) -> Result<RowSet> {
        let statement = statement.with_timeout(self.timeout);
        plait_trace_query!(&statement.sql, statement.params.len());

        let started = Instant::now();
        let rows = self.backend.query(&statement)?;
        if let Some(limit) = self.timeout
            && started.elapsed() > limit
        {
            return Err(BackendError::Timeout(limit).into());
        }
        Ok(rows)
    }
}
