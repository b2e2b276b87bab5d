use plait::prelude::*;

use crate::common::helpers::{names, related_names};
use crate::common::schema::{posts, projects};
use crate::common::{Db, link, seed, setup_db};

fn second_page() -> FindAll {
    FindAll::new().order_by("name").limit(1).offset(1)
}

fn alpha_bravo_charlie(db: &Db, entity: &str) {
    seed(db, entity, &["alpha", "bravo", "charlie"]);
}

#[test]
fn many_to_many_with_where_clause() {
    let db = setup_db(projects());
    alpha_bravo_charlie(&db, "Project");
    seed(&db, "User", &["Alice", "Bob"]);
    link(
        &db,
        "Project",
        "User",
        &[("alpha", "Alice"), ("bravo", "Bob"), ("charlie", "Alice")],
    );

    let result = db
        .find_all(
            "Project",
            second_page().include(Include::new("User").r#where(eq("name", "Alice"))),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["charlie"]);
    assert_eq!(related_names(&result[0], "User"), vec!["Alice"]);
}

#[test]
fn two_levels_of_required_many_to_many() {
    let db = setup_db(projects());
    alpha_bravo_charlie(&db, "Project");
    seed(&db, "User", &["Alice", "Bob"]);
    seed(&db, "Hobby", &["archery", "badminton"]);
    link(
        &db,
        "Project",
        "User",
        &[("alpha", "Alice"), ("bravo", "Bob"), ("charlie", "Alice")],
    );
    link(&db, "User", "Hobby", &[("Alice", "archery")]);

    let result = db
        .find_all(
            "Project",
            second_page().include(
                Include::new("User")
                    .required(true)
                    .include(Include::new("Hobby").required(true)),
            ),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["charlie"]);
    let users = result[0].many("User");
    assert_eq!(names(users), vec!["Alice"]);
    assert_eq!(related_names(&users[0], "Hobby"), vec!["archery"]);
}

#[test]
fn required_many_to_many() {
    let db = setup_db(projects());
    alpha_bravo_charlie(&db, "Project");
    seed(&db, "User", &["Alice", "Bob"]);
    link(&db, "Project", "User", &[("alpha", "Alice"), ("charlie", "Alice")]);

    let result = db
        .find_all(
            "Project",
            second_page().include(Include::new("User").required(true)),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["charlie"]);
}

#[test]
fn two_required_many_to_many_siblings() {
    let db = setup_db(projects());
    seed(&db, "Project", &["alpha", "bravo", "charlie", "delta"]);
    seed(&db, "User", &["Alice", "Bob", "David"]);
    seed(&db, "Task", &["a", "c", "d"]);
    link(
        &db,
        "Project",
        "User",
        &[("alpha", "Alice"), ("bravo", "Bob"), ("delta", "David")],
    );
    link(
        &db,
        "Project",
        "Task",
        &[("alpha", "a"), ("charlie", "c"), ("delta", "d")],
    );

    let result = db
        .find_all(
            "Project",
            second_page()
                .include(Include::new("User").required(true))
                .include(Include::new("Task").required(true)),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["delta"]);
    assert_eq!(related_names(&result[0], "User"), vec!["David"]);
    assert_eq!(related_names(&result[0], "Task"), vec!["d"]);
}

fn seed_comments(db: &Db) {
    alpha_bravo_charlie(db, "Post");
    seed(db, "Comment", &["comment1", "comment2"]);
    link(db, "Post", "Comment", &[("alpha", "comment1"), ("charlie", "comment2")]);
}

#[test]
fn required_one_to_many() {
    let db = setup_db(posts());
    seed_comments(&db);

    let result = db
        .find_all(
            "Post",
            second_page().include(Include::new("Comment").required(true)),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["charlie"]);
    assert_eq!(related_names(&result[0], "Comment"), vec!["comment2"]);
}

#[test]
fn required_one_to_many_with_where_clause() {
    let db = setup_db(posts());
    seed_comments(&db);

    let result = db
        .find_all(
            "Post",
            second_page().include(
                Include::new("Comment")
                    .required(true)
                    .r#where(like("name", "comment%")),
            ),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["charlie"]);
}

#[test]
fn where_that_matches_nothing_on_a_page_returns_empty() {
    let db = setup_db(posts());
    seed_comments(&db);

    let result = db
        .find_all(
            "Post",
            second_page().include(
                Include::new("Comment")
                    .required(true)
                    .r#where(like("name", "reply%")),
            ),
        )
        .unwrap();

    assert!(result.is_empty());
}

#[test]
fn repeated_calls_are_identical() {
    let db = setup_db(projects());
    seed(&db, "Project", &["alpha", "bravo", "charlie", "delta"]);
    seed(&db, "User", &["Alice", "Bob"]);
    link(
        &db,
        "Project",
        "User",
        &[("alpha", "Alice"), ("alpha", "Bob"), ("charlie", "Bob"), ("delta", "Alice")],
    );

    let query = FindAll::new()
        .include(Include::new("User").required(true))
        .order_by("name")
        .limit(2)
        .offset(1);

    let first = db.find_all("Project", query.clone()).unwrap();
    let second = db.find_all("Project", query).unwrap();
    assert_eq!(names(&first), vec!["charlie", "delta"]);
    assert_eq!(first, second);
}

#[test]
fn largest_limit_returns_every_root() {
    let db = setup_db(posts());
    seed_comments(&db);

    let result = db
        .find_all("Post", FindAll::new().order_by("name").limit(u64::MAX))
        .unwrap();
    assert_eq!(names(&result), vec!["alpha", "bravo", "charlie"]);

    let result = db
        .find_all(
            "Post",
            FindAll::new()
                .include(Include::new("Comment").required(true))
                .order_by("name")
                .limit(u64::MAX)
                .offset(1),
        )
        .unwrap();
    assert_eq!(names(&result), vec!["charlie"]);
}
