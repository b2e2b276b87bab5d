use plait::prelude::*;

use crate::common::helpers::names;
use crate::common::schema::{posts, projects};
use crate::common::{Db, link, seed, setup_db};

fn seed_projects(db: &Db) {
    seed(db, "Project", &["alpha", "bravo", "charlie", "delta"]);
    seed(db, "User", &["Alice", "Bob", "Carol"]);
    seed(db, "Hobby", &["archery", "badminton", "chess"]);
    link(
        db,
        "Project",
        "User",
        &[("alpha", "Bob"), ("bravo", "Alice"), ("bravo", "Carol"), ("charlie", "Carol")],
    );
    link(
        db,
        "User",
        "Hobby",
        &[("Alice", "archery"), ("Bob", "chess"), ("Carol", "badminton")],
    );
}

#[test]
fn descending_root_order() {
    let db = setup_db(projects());
    seed_projects(&db);

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .order_by(("name", Direction::Desc))
                .limit(3),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["delta", "charlie", "bravo"]);
}

#[test]
fn order_by_included_attribute_uses_min_ascending() {
    let db = setup_db(projects());
    seed_projects(&db);

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").required(true))
                .order_by(OrderKey::through(["User"], "name"))
                .limit(3),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["bravo", "alpha", "charlie"]);
}

#[test]
fn order_by_included_attribute_uses_max_descending() {
    let db = setup_db(projects());
    seed_projects(&db);

    // bravo and charlie both peak at Carol; the primary key breaks the tie.
    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").required(true))
                .order_by(OrderKey::through(["User"], "name").desc())
                .limit(2),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["bravo", "charlie"]);
}

#[test]
fn order_by_attribute_two_levels_down() {
    let db = setup_db(projects());
    seed_projects(&db);

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(
                    Include::new("User")
                        .required(true)
                        .include(Include::new("Hobby").required(true)),
                )
                .order_by(OrderKey::through(["User", "Hobby"], "name"))
                .limit(3),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["bravo", "charlie", "alpha"]);
}

#[test]
fn order_by_separately_loaded_include_without_pagination() {
    let db = setup_db(projects());
    seed_projects(&db);

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").required(false))
                .order_by(OrderKey::through(["User"], "name").desc()),
        )
        .unwrap();

    // delta has no users and the MAX is NULL, which SQLite sorts first.
    assert_eq!(names(&result), vec!["bravo", "charlie", "alpha", "delta"]);
}

#[test]
fn child_order_is_applied_per_parent() {
    let db = setup_db(projects());
    seed_projects(&db);

    for separate in [true, false] {
        let result = db
            .find_all(
                "Project",
                FindAll::new()
                    .include(
                        Include::new("User")
                            .separate(separate)
                            .order_by(("name", Direction::Desc)),
                    )
                    .order_by("name"),
            )
            .unwrap();
        assert_eq!(names(result[1].many("User")), vec!["Carol", "Alice"]);
    }
}

#[test]
fn order_on_non_key_attribute_breaks_ties_on_primary_key() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha"]);
    for (name, votes) in [("c1", 3), ("c2", 5), ("c3", 3)] {
        db.insert("Comment", &[("name", name.into()), ("votes", votes.into())])
            .unwrap();
    }
    link(&db, "Post", "Comment", &[("alpha", "c3"), ("alpha", "c2"), ("alpha", "c1")]);

    let result = db
        .find_all(
            "Post",
            FindAll::new().include(Include::new("Comment").order_by("votes")),
        )
        .unwrap();

    assert_eq!(names(result[0].many("Comment")), vec!["c1", "c3", "c2"]);
}
