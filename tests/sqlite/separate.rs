use plait::prelude::*;

use crate::common::helpers::{names, related_names};
use crate::common::schema::{posts, projects};
use crate::common::{Db, link, seed, setup_db, setup_db_with};

fn seed_projects(db: &Db) {
    seed(db, "Project", &["alpha", "bravo", "charlie", "delta"]);
    seed(db, "User", &["Alice", "Bob", "Carol"]);
    seed(db, "Hobby", &["archery", "chess"]);
    link(
        db,
        "Project",
        "User",
        &[
            ("alpha", "Alice"),
            ("alpha", "Bob"),
            ("bravo", "Carol"),
            ("delta", "Alice"),
            ("delta", "Carol"),
        ],
    );
    link(db, "User", "Hobby", &[("Alice", "archery"), ("Alice", "chess"), ("Carol", "chess")]);
}

fn users_with_hobbies(separate: bool) -> FindAll {
    FindAll::new()
        .include(
            Include::new("User")
                .separate(separate)
                .order_by("name")
                .include(Include::new("Hobby").separate(separate)),
        )
        .order_by("name")
}

#[test]
fn separate_and_inline_loading_agree() {
    let db = setup_db(projects());
    seed_projects(&db);

    let separate = db.find_all("Project", users_with_hobbies(true)).unwrap();
    let inline = db.find_all("Project", users_with_hobbies(false)).unwrap();

    assert_eq!(names(&separate), vec!["alpha", "bravo", "charlie", "delta"]);
    assert_eq!(separate, inline);

    let alpha_users = separate[0].many("User");
    assert_eq!(names(alpha_users), vec!["Alice", "Bob"]);
    assert_eq!(related_names(&alpha_users[0], "Hobby"), vec!["archery", "chess"]);
    assert!(alpha_users[1].many("Hobby").is_empty());
}

#[test]
fn paginated_query_with_separate_collection() {
    let db = setup_db(projects());
    seed_projects(&db);

    let result = db
        .find_all(
            "Project",
            FindAll::new()
                .include(Include::new("User").order_by("name"))
                .order_by("name")
                .limit(2)
                .offset(1),
        )
        .unwrap();

    assert_eq!(names(&result), vec!["bravo", "charlie"]);
    assert_eq!(names(result[0].many("User")), vec!["Carol"]);
    assert!(result[1].many("User").is_empty());
}

#[test]
fn inline_collections_by_config() {
    let db = setup_db_with(
        projects(),
        Config::default().with_separate_collections(false),
    );
    seed_projects(&db);

    let query = FindAll::new()
        .include(Include::new("User").order_by("name"))
        .order_by("name")
        .limit(2);
    let explained = db.explain("Project", &query).unwrap();
    assert!(
        explained.starts_with("Project [two-phase, limit 2]\n  User (many, inline)\n"),
        "{explained}"
    );

    let result = db.find_all("Project", query).unwrap();
    assert_eq!(names(&result), vec!["alpha", "bravo"]);
    assert_eq!(names(result[0].many("User")), vec!["Alice", "Bob"]);
}

#[test]
fn key_lists_are_chunked() {
    let chunked = setup_db_with(projects(), Config::default().with_max_bind_params(1));
    seed_projects(&chunked);
    let whole = setup_db(projects());
    seed_projects(&whole);

    let query = users_with_hobbies(true);
    assert_eq!(
        chunked.find_all("Project", query.clone()).unwrap(),
        whole.find_all("Project", query).unwrap()
    );

    // Two-phase hydrate over a chunked id list keeps the page order.
    let query = FindAll::new()
        .include(Include::new("User").required(true))
        .order_by(OrderKey::from(("name", Direction::Desc)));
    let page = chunked
        .find_all("Project", query.limit(3))
        .unwrap();
    assert_eq!(names(&page), vec!["delta", "bravo", "alpha"]);
}

#[test]
fn has_many_loaded_separately() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha", "bravo"]);
    seed(&db, "Comment", &["c1", "c2", "c3"]);
    link(&db, "Post", "Comment", &[("alpha", "c1"), ("bravo", "c2"), ("bravo", "c3")]);

    let result = db
        .find_all(
            "Post",
            FindAll::new()
                .include(Include::new("Comment").order_by(OrderKey::asc("name").desc()))
                .order_by("name"),
        )
        .unwrap();

    assert_eq!(names(result[0].many("Comment")), vec!["c1"]);
    assert_eq!(names(result[1].many("Comment")), vec!["c3", "c2"]);
}
