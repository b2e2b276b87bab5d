use plait::Plait;
use plait::prelude::*;
use plait::sqlite::SqliteBackend;

pub type Db = Plait<SqliteBackend>;

/// An in-memory database with every table of `registry` created.
pub fn setup_db(registry: Registry) -> Db {
    setup_db_with(registry, Config::default())
}

pub fn setup_db_with(registry: Registry, config: Config) -> Db {
    let backend = SqliteBackend::open_in_memory().expect("Failed to create in-memory database");
    let db = Plait::new(backend, registry).with_config(config);
    db.sync().expect("Failed to create tables");
    db
}

/// Inserts one row per name into `entity`.
pub fn seed(db: &Db, entity: &str, names: &[&str]) {
    for name in names {
        db.insert(entity, &[("name", (*name).into())])
            .unwrap_or_else(|e| panic!("Failed to insert {entity} {name}: {e}"));
    }
}

/// Links each `(source, target)` pair along `source_type.target_type`.
pub fn link(db: &Db, source_type: &str, target_type: &str, pairs: &[(&str, &str)]) {
    for (source, target) in pairs {
        db.link(source_type, *source, target_type, *target)
            .unwrap_or_else(|e| panic!("Failed to link {source} -> {target}: {e}"));
    }
}
