use plait::prelude::*;
use serde_json::json;

use crate::common::schema::posts;
use crate::common::{link, seed, setup_db};

fn page() -> FindAll {
    FindAll::new()
        .include(Include::new("Comment").required(true))
        .order_by("name")
        .limit(1)
        .offset(1)
}

#[test]
fn explain_shows_plan_and_first_statement() {
    let db = setup_db(posts());
    let explained = db.explain("Post", &page()).unwrap();
    assert_eq!(
        explained,
        concat!(
            "Post [two-phase, limit 1, offset 1]\n",
            "  Comment (many, inline, required)\n",
            r#"SELECT "t0"."name" FROM "Post" AS "t0" WHERE EXISTS (SELECT 1 FROM "Comment" AS "e1" "#,
            r#"WHERE "e1"."post_name" = "t0"."name") ORDER BY "t0"."name" ASC LIMIT 1 OFFSET 1"#
        )
    );
}

#[test]
fn plan_of_unpaginated_query_is_a_single_select() {
    let db = setup_db(posts());
    let statement = db
        .plan("Post", &FindAll::new().r#where(eq("name", "alpha")))
        .unwrap();
    assert_eq!(
        statement.sql,
        r#"SELECT "t0"."name" AS "Post.name" FROM "Post" AS "t0" WHERE "t0"."name" = ? ORDER BY "t0"."name" ASC"#
    );
    assert_eq!(statement.params, vec![Value::from("alpha")]);
}

#[test]
fn plan_does_not_touch_the_database() {
    let db = setup_db(posts());
    let before = db.find_all("Post", FindAll::new()).unwrap();
    db.plan("Post", &page()).unwrap();
    db.explain("Post", &page()).unwrap();
    assert_eq!(db.find_all("Post", FindAll::new()).unwrap(), before);
}

#[test]
fn entities_serialize_to_nested_json() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha"]);
    db.insert("Comment", &[("name", "c1".into()), ("votes", 2.into())])
        .unwrap();
    link(&db, "Post", "Comment", &[("alpha", "c1")]);

    let result = db
        .find_all("Post", FindAll::new().include(Include::new("Comment")))
        .unwrap();

    assert_eq!(
        result[0].to_json().unwrap(),
        json!({
            "name": "alpha",
            "Comment": [{ "name": "c1", "votes": 2, "post_name": "alpha" }],
        })
    );
}

#[test]
fn belongs_to_is_a_single_object() {
    let db = setup_db(posts());
    seed(&db, "Post", &["alpha"]);
    seed(&db, "Comment", &["c1", "orphan"]);
    link(&db, "Post", "Comment", &[("alpha", "c1")]);

    let result = db
        .find_all(
            "Comment",
            FindAll::new().include(Include::new("Post")).order_by("name"),
        )
        .unwrap();

    assert_eq!(
        result[0].one("Post").and_then(|p| p.get("name")),
        Some(&Value::from("alpha"))
    );
    assert!(matches!(result[1].related("Post"), Some(Related::One(None))));
    assert_eq!(result[1].to_json().unwrap()["Post"], serde_json::Value::Null);
}
