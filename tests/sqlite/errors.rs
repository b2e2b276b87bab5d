use plait::error::{BackendError, PlaitError};
use plait::prelude::*;

use crate::common::schema::{posts, projects};
use crate::common::setup_db;

#[test]
fn unknown_root_entity() {
    let db = setup_db(projects());
    let err = db.find_all("Planet", FindAll::new()).unwrap_err();
    assert!(matches!(err, PlaitError::UnknownEntity(name) if name == "Planet"));
}

#[test]
fn unknown_nested_association_reports_full_path() {
    let db = setup_db(projects());
    let err = db
        .find_all(
            "Project",
            FindAll::new().include(Include::new("User").include(Include::new("Task"))),
        )
        .unwrap_err();

    match err {
        PlaitError::UnknownAssociation {
            path,
            entity,
            target,
        } => {
            assert_eq!(path, "Project.User.Task");
            assert_eq!(entity, "User");
            assert_eq!(target, "Task");
        }
        other => panic!("expected unknown association, got {other:?}"),
    }
}

#[test]
fn where_on_unknown_attribute() {
    let db = setup_db(posts());
    let err = db
        .find_all(
            "Post",
            FindAll::new().include(Include::new("Comment").r#where(eq("score", 1))),
        )
        .unwrap_err();
    assert!(matches!(err, PlaitError::InvalidInclude { path, .. } if path == "Post.Comment"));
}

#[test]
fn order_by_path_that_is_not_included() {
    let db = setup_db(projects());
    let err = db
        .find_all(
            "Project",
            FindAll::new().order_by(OrderKey::through(["User"], "name")),
        )
        .unwrap_err();
    assert!(matches!(err, PlaitError::InvalidInclude { .. }), "{err}");
}

#[test]
fn same_association_included_twice() {
    let db = setup_db(projects());
    let err = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User"))
                .include(Include::new("User").required(true)),
        )
        .unwrap_err();
    assert!(matches!(err, PlaitError::InvalidInclude { .. }), "{err}");
}

#[test]
fn required_include_cannot_be_separate() {
    let db = setup_db(projects());
    let err = db
        .find_all(
            "Project",
            FindAll::new().include(Include::new("User").required(true).separate(true)),
        )
        .unwrap_err();
    assert!(
        matches!(err, PlaitError::UnsupportedIncludeCombination { path, .. } if path == "Project.User")
    );
}

#[test]
fn paginated_order_through_separate_include() {
    let db = setup_db(projects());
    let err = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User"))
                .order_by(OrderKey::through(["User"], "name"))
                .limit(1),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PlaitError::UnsupportedIncludeCombination { .. }
    ));
}

#[test]
fn errors_are_reported_before_touching_the_database() {
    // No `sync`: a validation error must win over the missing tables.
    let backend = plait::sqlite::SqliteBackend::open_in_memory().unwrap();
    let db = Plait::new(backend, projects());
    let err = db
        .find_all("Project", FindAll::new().include(Include::new("Nope")))
        .unwrap_err();
    assert!(matches!(err, PlaitError::UnknownAssociation { .. }));

    let err = db.find_all("Project", FindAll::new()).unwrap_err();
    assert!(matches!(err, PlaitError::Backend(BackendError::Rusqlite(_))), "{err}");
}

#[test]
fn linking_unknown_association() {
    let db = setup_db(posts());
    let err = db.link("Post", "alpha", "Tag", "rust").unwrap_err();
    assert!(matches!(err, PlaitError::UnknownAssociation { .. }), "{err}");
}
