use plait::prelude::*;

use crate::common::helpers::{names, related_names};
use crate::common::schema::{posts, projects};
use crate::common::{link, seed, setup_db};

#[test]
fn root_matching_several_children_appears_once() {
    let db = setup_db(projects());
    seed(&db, "Project", &["alpha", "bravo"]);
    seed(&db, "User", &["Alice", "Bob", "Carol"]);
    link(
        &db,
        "Project",
        "User",
        &[("alpha", "Alice"), ("alpha", "Bob"), ("alpha", "Carol"), ("bravo", "Bob")],
    );

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").required(true))
                .order_by("name"),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["alpha", "bravo"]);
    assert_eq!(related_names(&result[0], "User"), vec!["Alice", "Bob", "Carol"]);
    assert_eq!(related_names(&result[1], "User"), vec!["Bob"]);
}

#[test]
fn cross_product_of_siblings_is_collapsed() {
    let db = setup_db(projects());
    seed(&db, "Project", &["alpha"]);
    seed(&db, "User", &["Alice", "Bob"]);
    seed(&db, "Task", &["a", "b", "c"]);
    link(&db, "Project", "User", &[("alpha", "Alice"), ("alpha", "Bob")]);
    link(&db, "Project", "Task", &[("alpha", "a"), ("alpha", "b"), ("alpha", "c")]);

    // Both inline: 2 x 3 joined rows for one project.
    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").separate(false))
                .include(Include::new("Task").separate(false)),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["alpha"]);
    assert_eq!(result[0].many("User").len(), 2);
    assert_eq!(result[0].many("Task").len(), 3);
}

#[test]
fn shared_grandchild_is_assembled_under_each_parent() {
    let db = setup_db(projects());
    seed(&db, "Project", &["alpha"]);
    seed(&db, "User", &["Alice", "Bob"]);
    seed(&db, "Hobby", &["chess"]);
    link(&db, "Project", "User", &[("alpha", "Alice"), ("alpha", "Bob")]);
    link(&db, "User", "Hobby", &[("Alice", "chess"), ("Bob", "chess")]);

    let result = db
        .find_all(
            "Project",
            FindAll::new().include(
                Include::new("User")
                    .separate(false)
                    .include(Include::new("Hobby").separate(false)),
            ),
        )
        .unwrap();

    let users = result[0].many("User");
    assert_eq!(users.len(), 2);
    for user in users {
        assert_eq!(related_names(user, "Hobby"), vec!["chess"]);
    }
}

#[test]
fn optional_filter_keeps_roots_and_filters_children() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha", "bravo", "charlie"]);
    seed(&db, "Comment", &["comment1", "reply1", "comment2"]);
    link(
        &db,
        "Post",
        "Comment",
        &[("alpha", "comment1"), ("alpha", "reply1"), ("charlie", "comment2")],
    );

    let result = db
        .find_all(
            "Post",
            FindAll::new()
                .include(
                    Include::new("Comment")
                        .required(false)
                        .r#where(like("name", "comment%")),
                )
                .order_by("name"),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["alpha", "bravo", "charlie"]);
    assert_eq!(related_names(&result[0], "Comment"), vec!["comment1"]);
    assert!(result[1].many("Comment").is_empty());
    assert_eq!(related_names(&result[2], "Comment"), vec!["comment2"]);
}

#[test]
fn roots_without_children_get_an_empty_collection() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha", "bravo"]);

    for separate in [true, false] {
        let result = db
            .find_all(
                "Post",
                FindAll::new()
                    .include(Include::new("Comment").separate(separate))
                    .order_by("name"),
            )
            .unwrap();
        assert_eq!(names(&result), vec!["alpha", "bravo"]);
        assert!(matches!(result[0].related("Comment"), Some(Related::Many(v)) if v.is_empty()));
    }
}

#[test]
fn where_implies_required_can_be_disabled() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha", "bravo"]);
    seed(&db, "Comment", &["comment1"]);
    link(&db, "Post", "Comment", &[("alpha", "comment1")]);

    let query = FindAll::new()
        .include(Include::new("Comment").r#where(eq("name", "comment1")))
        .order_by("name");

    let implied = db.find_all("Post", query.clone()).unwrap();
    assert_eq!(names(&implied), vec!["alpha"]);

    let db = db.with_config(Config::default().with_where_implies_required(false));
    let optional = db.find_all("Post", query).unwrap();
    assert_eq!(names(&optional), vec!["alpha", "bravo"]);
}
