//! # `Database` facade (C9, §4.7)
//!
//! Binds one [`Session`] and [`SparqlEngine`] into a single entry point for
//! the fluent builders. Construction fails exactly like [`PodDialect::new`]
//! does — not logged in, or no webId to derive a pod base from.

use std::future::Future;
use std::sync::Arc;

use pod_query_builders::{DeleteBuilder, InsertBuilder, SelectBuilder, UpdateBuilder};
use pod_query_executor::{PodDialect, PodDialectConfig, Session, SparqlEngine};
use pod_query_ir::{RowValues, Table};

use crate::error::PodQueryResult;

pub struct Database {
    dialect: PodDialect,
}

impl Database {
    pub fn new(session: Arc<dyn Session>, engine: Arc<dyn SparqlEngine>) -> PodQueryResult<Self> {
        Self::with_config(session, engine, PodDialectConfig::default())
    }

    pub fn with_config(
        session: Arc<dyn Session>,
        engine: Arc<dyn SparqlEngine>,
        config: PodDialectConfig,
    ) -> PodQueryResult<Self> {
        Ok(Self {
            dialect: PodDialect::new(session, engine, config)?,
        })
    }

    /// Register an additional SPARQL prefix used by every statement
    /// rendered from here on (§9 "Named prefixes registry").
    pub fn add_prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.dialect.add_prefix(prefix, uri);
    }

    pub fn select(&self, table: Table) -> SelectBuilder<'_> {
        SelectBuilder::new(&self.dialect, table)
    }

    pub fn insert(&self, table: Table, rows: Vec<RowValues>) -> InsertBuilder<'_> {
        InsertBuilder::new(&self.dialect, table, rows)
    }

    pub fn update(&self, table: Table, set: RowValues) -> UpdateBuilder<'_> {
        UpdateBuilder::new(&self.dialect, table, set)
    }

    pub fn delete(&self, table: Table) -> DeleteBuilder<'_> {
        DeleteBuilder::new(&self.dialect, table)
    }

    /// Runs `f` against this database, sequentially, on the same session.
    /// This provides no isolation — a statement inside `f` can observe an
    /// earlier one's writes, and a failure partway through leaves prior
    /// writes in place. It only groups work so callers get one error type
    /// and don't need to thread the database through manually (§4.7).
    pub async fn transaction<F, Fut, T>(&self, f: F) -> PodQueryResult<T>
    where
        F: FnOnce(&Database) -> Fut,
        Fut: Future<Output = PodQueryResult<T>>,
    {
        f(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pod_query_ir::{and, eq, is_null, like, not, or, Aggregate, ColumnRef, RowValues, SelectField, Value};
    use pod_query_test_utils::{fixtures, MockSession, MockSparqlEngine};
    use std::sync::Arc;

    fn database() -> Database {
        let pod = pod_query_test_utils::InMemoryPod::shared();
        let session = Arc::new(MockSession::with_pod(pod.clone(), "https://alice.example/profile/card#me"));
        let engine = Arc::new(MockSparqlEngine::with_pod(pod));
        Database::new(session, engine).unwrap()
    }

    fn row(pairs: &[(&str, Value)]) -> RowValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn construction_rejects_anonymous_session() {
        let session = Arc::new(MockSession::anonymous());
        let engine = Arc::new(MockSparqlEngine::new());
        let result = Database::new(session, engine);
        assert!(matches!(result, Err(crate::error::PodQueryError::Pod(pod_query_executor::PodError::NotLoggedIn))));
    }

    // §8 S1 — basic CRUD round trip.
    #[tokio::test]
    async fn basic_crud_round_trip() {
        let db = database();
        let profiles = fixtures::profiles_table();

        db.insert(
            profiles.clone(),
            vec![row(&[
                ("id", Value::String("p1".into())),
                ("name", Value::String("Alice".into())),
                ("age", Value::Integer(30)),
                ("createdAt", Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
            ])],
        )
        .execute()
        .await
        .unwrap();

        let rows = db
            .select(profiles.clone())
            .where_(eq("id", "p1"))
            .execute()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap().as_str(), Some("Alice"));
        assert_eq!(rows[0].get("age").unwrap().as_i64(), Some(30));

        db.update(profiles.clone(), row(&[("name", Value::String("Alice U.".into())), ("age", Value::Integer(31))]))
            .where_(eq("id", "p1"))
            .execute()
            .await
            .unwrap();

        let rows = db
            .select(profiles.clone())
            .where_(eq("id", "p1"))
            .execute()
            .await
            .unwrap();
        assert_eq!(rows[0].get("name").unwrap().as_str(), Some("Alice U."));
        assert_eq!(rows[0].get("age").unwrap().as_i64(), Some(31));

        db.delete(profiles.clone()).where_(eq("id", "p1")).execute().await.unwrap();

        let rows = db.select(profiles).where_(eq("id", "p1")).execute().await.unwrap();
        assert!(rows.is_empty());
    }

    // §8 S2 — distinct projection, then offset+limit over an ordered set.
    #[tokio::test]
    async fn distinct_and_paginated_ages() {
        let db = database();
        let profiles = fixtures::profiles_table();
        let created = Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        db.insert(
            profiles.clone(),
            vec![
                row(&[("id", Value::String("b1".into())), ("name", Value::String("Batch Alpha".into())), ("age", Value::Integer(22)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("b2".into())), ("name", Value::String("Batch Beta".into())), ("age", Value::Integer(27)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("b3".into())), ("name", Value::String("Batch Gamma".into())), ("age", Value::Integer(31)), ("createdAt", created)]),
            ],
        )
        .execute()
        .await
        .unwrap();

        let rows = db
            .select(profiles.clone())
            .select(vec![("age".to_string(), SelectField::Column(ColumnRef::new("age")))])
            .distinct(true)
            .order_by("age", false)
            .execute()
            .await
            .unwrap();
        let ages: Vec<i64> = rows.iter().map(|r| r.get("age").unwrap().as_i64().unwrap()).collect();
        assert_eq!(ages, vec![22, 27, 31]);

        let rows = db
            .select(profiles)
            .order_by("age", false)
            .offset(1)
            .limit(1)
            .execute()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap().as_str(), Some("Batch Beta"));
    }

    // §8 S3 — LIKE / OR / NOT / IS NULL.
    #[tokio::test]
    async fn like_or_not_and_is_null_filters() {
        let db = database();
        let profiles = fixtures::profiles_table();
        let created = Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        db.insert(
            profiles.clone(),
            vec![
                row(&[("id", Value::String("s1".into())), ("name", Value::String("Search Alpha".into())), ("age", Value::Integer(20)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("s2".into())), ("name", Value::String("Search Beta".into())), ("age", Value::Integer(25)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("s3".into())), ("name", Value::String("Search Gamma".into())), ("age", Value::Integer(30)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("s4".into())), ("name", Value::String("Other Delta".into())), ("age", Value::Null), ("createdAt", created)]),
            ],
        )
        .execute()
        .await
        .unwrap();

        let rows = db.select(profiles.clone()).where_(like("name", "search%")).execute().await.unwrap();
        assert_eq!(rows.len(), 3);

        let rows = db
            .select(profiles.clone())
            .where_(or(vec![eq("age", 20i64), eq("age", 30i64)]))
            .execute()
            .await
            .unwrap();
        let mut names: Vec<_> = rows.iter().map(|r| r.get("name").unwrap().as_str().unwrap().to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["Search Alpha", "Search Gamma"]);

        let rows = db.select(profiles.clone()).where_(is_null("age")).execute().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name").unwrap().as_str(), Some("Other Delta"));

        let rows = db
            .select(profiles)
            .where_(not(eq("name", "Search Beta")))
            .execute()
            .await
            .unwrap();
        assert!(rows.iter().all(|r| r.get("name").unwrap().as_str() != Some("Search Beta")));
    }

    // §8 S4 — aggregates over a filtered set, routed through the fallback planner.
    #[tokio::test]
    async fn aggregates_over_filtered_rows() {
        let db = database();
        let profiles = fixtures::profiles_table();
        let created = Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        db.insert(
            profiles.clone(),
            vec![
                row(&[("id", Value::String("a1".into())), ("name", Value::String("Aggregate One".into())), ("age", Value::Integer(21)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("a2".into())), ("name", Value::String("Aggregate Two".into())), ("age", Value::Integer(29)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("a3".into())), ("name", Value::String("Aggregate Three".into())), ("age", Value::Integer(42)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("a4".into())), ("name", Value::String("Aggregate Four".into())), ("age", Value::Null), ("createdAt", created)]),
            ],
        )
        .execute()
        .await
        .unwrap();

        let rows = db
            .select(profiles)
            .select(vec![
                ("total".to_string(), SelectField::Aggregate(Aggregate::count(None).as_alias("total"))),
                ("withAge".to_string(), SelectField::Aggregate(Aggregate::count(Some(ColumnRef::new("age"))).as_alias("withAge"))),
                ("maxAge".to_string(), SelectField::Aggregate(Aggregate::max("age").as_alias("maxAge"))),
                ("avgAge".to_string(), SelectField::Aggregate(Aggregate::avg("age").as_alias("avgAge"))),
            ])
            .where_(like("name", "Aggregate%"))
            .execute()
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("total").unwrap().as_i64(), Some(4));
        assert_eq!(rows[0].get("withAge").unwrap().as_i64(), Some(3));
        assert_eq!(rows[0].get("maxAge").unwrap().as_i64(), Some(42));
    }

    // §8 S6 — conditional update by a non-id predicate.
    #[tokio::test]
    async fn conditional_update_by_name() {
        let db = database();
        let profiles = fixtures::profiles_table();
        let created = Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        db.insert(
            profiles.clone(),
            vec![
                row(&[("id", Value::String("c1".into())), ("name", Value::String("A".into())), ("age", Value::Integer(20)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("c2".into())), ("name", Value::String("B".into())), ("age", Value::Integer(25)), ("createdAt", created.clone())]),
                row(&[("id", Value::String("c3".into())), ("name", Value::String("C".into())), ("age", Value::Integer(30)), ("createdAt", created)]),
            ],
        )
        .execute()
        .await
        .unwrap();

        db.update(profiles.clone(), row(&[("age", Value::Integer(99))]))
            .where_(or(vec![eq("name", "A"), eq("name", "C")]))
            .execute()
            .await
            .unwrap();

        let rows = db.select(profiles).order_by("name", false).execute().await.unwrap();
        let ages: Vec<i64> = rows.iter().map(|r| r.get("age").unwrap().as_i64().unwrap()).collect();
        assert_eq!(ages, vec![99, 25, 99]);
    }

    // §8 S5 — inner/left join over users/posts, routed through the fallback planner.
    #[tokio::test]
    async fn inner_and_left_join_over_users_and_posts() {
        let db = database();
        let users = fixtures::users_table();
        let posts = fixtures::posts_table();

        db.insert(
            users.clone(),
            vec![
                row(&[("id", Value::String("user-1".into())), ("name", Value::String("Alice Author".into()))]),
                row(&[("id", Value::String("user-2".into())), ("name", Value::String("Bob Writer".into()))]),
            ],
        )
        .execute()
        .await
        .unwrap();

        db.insert(
            posts.clone(),
            vec![
                row(&[
                    ("id", Value::String("post-1".into())),
                    ("title", Value::String("Solid Intro".into())),
                    ("authorId", Value::String("user-1".into())),
                ]),
                row(&[
                    ("id", Value::String("post-2".into())),
                    ("title", Value::String("SPARQL Tricks".into())),
                    ("authorId", Value::String("user-2".into())),
                ]),
                row(&[
                    ("id", Value::String("post-3".into())),
                    ("title", Value::String("No Author Yet".into())),
                    ("authorId", Value::String("user-999".into())),
                ]),
            ],
        )
        .execute()
        .await
        .unwrap();

        let join_conditions = vec![(ColumnRef::qualified("users", "id"), ColumnRef::qualified("posts", "authorId"))];

        let rows = db
            .select(posts.clone())
            .inner_join(users.clone(), join_conditions.clone())
            .unwrap()
            .select(vec![
                ("title".to_string(), SelectField::Column(ColumnRef::qualified("posts", "title"))),
                ("authorName".to_string(), SelectField::Column(ColumnRef::qualified("users", "name"))),
            ])
            .order_by(ColumnRef::qualified("posts", "title"), false)
            .execute()
            .await
            .unwrap();

        let got: Vec<(Option<&str>, Option<&str>)> = rows
            .iter()
            .map(|r| (r.get("title").and_then(Value::as_str), r.get("authorName").and_then(Value::as_str)))
            .collect();
        assert_eq!(
            got,
            vec![(Some("Solid Intro"), Some("Alice Author")), (Some("SPARQL Tricks"), Some("Bob Writer"))]
        );

        let rows = db
            .select(posts)
            .left_join(users, join_conditions)
            .unwrap()
            .select(vec![
                ("title".to_string(), SelectField::Column(ColumnRef::qualified("posts", "title"))),
                ("authorName".to_string(), SelectField::Column(ColumnRef::qualified("users", "name"))),
            ])
            .order_by(ColumnRef::qualified("posts", "title"), false)
            .execute()
            .await
            .unwrap();

        let got: Vec<(Option<&str>, Option<&str>)> = rows
            .iter()
            .map(|r| (r.get("title").and_then(Value::as_str), r.get("authorName").and_then(Value::as_str)))
            .collect();
        // "No Author Yet" sorts first case-insensitively ('n' < 's'); the
        // spec's prose calls it "additional", not last-by-sort-key.
        assert_eq!(
            got,
            vec![
                (Some("No Author Yet"), None),
                (Some("Solid Intro"), Some("Alice Author")),
                (Some("SPARQL Tricks"), Some("Bob Writer")),
            ]
        );
    }

    #[tokio::test]
    async fn transaction_groups_sequential_statements() {
        let db = database();
        let profiles = fixtures::profiles_table();
        let created = Value::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

        db.transaction(|tx| async move {
            tx.insert(
                profiles.clone(),
                vec![row(&[
                    ("id", Value::String("t1".into())),
                    ("name", Value::String("Tx".into())),
                    ("age", Value::Integer(1)),
                    ("createdAt", created),
                ])],
            )
            .execute()
            .await?;
            let rows = tx.select(profiles).where_(eq("id", "t1")).execute().await?;
            Ok(rows.len())
        })
        .await
        .map(|count| assert_eq!(count, 1))
        .unwrap();
    }

    // and/not imported above but `and` only used indirectly through `or`'s
    // sibling combinator in other suites; keep the import honest here too.
    #[allow(unused_imports)]
    use pod_query_ir::and as _and_is_exercised_in_builders_crate;
}
