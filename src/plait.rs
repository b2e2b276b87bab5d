use plait_core::{
    Backend, Config, Entity, FindAll, JoinPlan, Registry, Result, Statement, Value,
    include::normalize,
};

/// A registry bound to a backend handle.
///
/// Every call runs sequentially on the one backend; the wrapper holds no
/// state besides the registry and the configuration.
#[derive(Debug)]
pub struct Plait<B: Backend> {
    backend: B,
    registry: Registry,
    config: Config,
}

impl<B: Backend> Plait<B> {
    pub fn new(backend: B, registry: Registry) -> Self {
        Self {
            backend,
            registry,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drops and recreates every table of the registry.
    pub fn sync(&self) -> Result<()> {
        plait_core::plait_trace_schema!("sync", self.registry.entities().count());
        let dialect = self.backend.dialect();
        for statement in self
            .registry
            .drop_statements(dialect)
            .into_iter()
            .chain(self.registry.create_statements(dialect))
        {
            self.run(statement)?;
        }
        Ok(())
    }

    /// Inserts one entity; returns the affected row count.
    pub fn insert(&self, entity: &str, values: &[(&str, Value)]) -> Result<usize> {
        let statement = self
            .registry
            .insert_statement(self.backend.dialect(), entity, values)?;
        self.run(statement)
    }

    /// Relates `source_key` of `source` to `target_key` of `target` along
    /// the association named `target`.
    pub fn link(
        &self,
        source: &str,
        source_key: impl Into<Value>,
        target: &str,
        target_key: impl Into<Value>,
    ) -> Result<usize> {
        let statement = self.registry.link_statement(
            self.backend.dialect(),
            source,
            source_key.into(),
            target,
            target_key.into(),
        )?;
        self.run(statement)
    }

    /// Loads `root` entities with their includes.
    pub fn find_all(&self, root: &str, query: FindAll) -> Result<Vec<Entity>> {
        plait_core::find_all(&self.registry, &self.backend, &self.config, root, &query)
    }

    /// The first statement `find_all` would run, without running it.
    pub fn plan(&self, root: &str, query: &FindAll) -> Result<Statement> {
        let plan = self.build(root, query)?;
        Ok(plan.render_entry(self.backend.dialect()))
    }

    /// The plan tree followed by the first statement's SQL.
    pub fn explain(&self, root: &str, query: &FindAll) -> Result<String> {
        let plan = self.build(root, query)?;
        Ok(format!("{plan}{}", plan.render_entry(self.backend.dialect())))
    }

    fn build(&self, root: &str, query: &FindAll) -> Result<JoinPlan<'_>> {
        let tree = normalize(&self.registry, root, query, &self.config)?;
        JoinPlan::build(tree, &self.config)
    }

    fn run(&self, statement: Statement) -> Result<usize> {
        let statement = statement.with_timeout(self.config.timeout());
        plait_core::plait_trace_query!(&statement.sql, statement.params.len());
        Ok(self.backend.execute(&statement)?)
    }
}
