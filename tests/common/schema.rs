//! Fixture schema shared by the integration tests.
//!
//! Many-to-many:
//!   Task <---> Project <---> User <---> Hobby
//!
//! One-to-many:
//!   Post <+--> Comment

use plait::prelude::*;

fn named(entity: &str) -> EntityType {
    EntityType::new(entity, "name", AttrType::Text)
}

/// Projects, users, tasks and hobbies linked through join tables.
pub fn projects() -> Registry {
    let mut registry = Registry::new();
    registry
        .define(named("Project"))
        .define(named("User"))
        .define(named("Task"))
        .define(named("Hobby"));

    registry.belongs_to_many("User", "Project", "user_project").unwrap();
    registry.belongs_to_many("Project", "User", "user_project").unwrap();

    registry.belongs_to_many("Project", "Task", "task_project").unwrap();
    registry.belongs_to_many("Task", "Project", "task_project").unwrap();

    registry.belongs_to_many("User", "Hobby", "user_hobby").unwrap();
    registry.belongs_to_many("Hobby", "User", "user_hobby").unwrap();
    registry
}

/// Posts with comments; `Comment.post_name` references `Post.name`.
pub fn posts() -> Registry {
    let mut registry = Registry::new();
    registry
        .define(named("Post"))
        .define(named("Comment").attribute("votes", AttrType::Integer));
    registry.has_many("Post", "Comment").unwrap();
    registry
}
