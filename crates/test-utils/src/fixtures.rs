//! # Table fixtures (C_test1, §4.11)
//!
//! The `profiles`/`users`/`posts` schemas the end-to-end scenarios in §8
//! exercise, built once here so facade and builder tests don't each redefine
//! them slightly differently.

use pod_query_ir::{Column, ColumnType, Table};

/// `profiles(id PK, name NOT NULL, age, createdAt NOT NULL)` at
/// `drizzle-tests/t/`, class `schema:Person` (§8 S1–S4).
pub fn profiles_table() -> Table {
    Table::new(
        "profiles",
        "drizzle-tests/t/",
        "http://schema.org/Person",
        vec![
            Column::new("id", ColumnType::String).primary_key(),
            Column::new("name", ColumnType::String).required(),
            Column::new("age", ColumnType::Integer),
            Column::new("createdAt", ColumnType::DateTime).required(),
        ],
    )
    .unwrap()
}

/// `users(id, name)` (§8 S5).
pub fn users_table() -> Table {
    Table::new(
        "users",
        "drizzle-tests/t/users/",
        "http://schema.org/Person",
        vec![
            Column::new("id", ColumnType::String).primary_key(),
            Column::new("name", ColumnType::String).required(),
        ],
    )
    .unwrap()
}

/// `posts(id, title, authorId)`, `authorId` referencing `users.id` (§8 S5).
pub fn posts_table() -> Table {
    Table::new(
        "posts",
        "drizzle-tests/t/posts/",
        "http://schema.org/BlogPosting",
        vec![
            Column::new("id", ColumnType::String).primary_key(),
            Column::new("title", ColumnType::String).required(),
            Column::new("authorId", ColumnType::String).with_reference("drizzle-tests/t/users"),
        ],
    )
    .unwrap()
}
