//! # Join execution (C7, §4.5 "Join execution")
//!
//! Joins run sequentially, one at a time, in registration order. Each step
//! fetches the joined table (narrowed by an `IN` filter when possible),
//! hashes it by the first join condition, and merges it into the current
//! row set. Only the first condition of a multi-condition join drives the
//! hash; the rest are pushed to the post-filter list by the query builder
//! before this module ever sees the operation (§4.5's open question on
//! multi-condition joins).

use std::collections::HashMap;

use pod_query_executor::PodDialect;
use pod_query_ir::{in_array, ColumnRef, JoinDescriptor, JoinType, Row, Table, Value};
use tracing::debug;

use crate::error::PlannerResult;
use crate::post_filter::lookup;

/// A stable string key for hashing/grouping [`Value`]s that otherwise have
/// no total `Eq`/`Hash` impl (`f64`, `DateTime`).
fn value_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Run every registered join against `rows` (already seeded with the
/// primary alias's qualified keys), in registration order.
pub async fn apply_joins(
    dialect: &PodDialect,
    mut rows: Vec<Row>,
    joins: &[JoinDescriptor],
    tables: &HashMap<String, Table>,
) -> PlannerResult<Vec<Row>> {
    for join in joins {
        rows = apply_one_join(dialect, rows, join, tables).await?;
        debug!(alias = %join.alias, rows = rows.len(), "post-join row count");
    }
    Ok(rows)
}

async fn apply_one_join(
    dialect: &PodDialect,
    rows: Vec<Row>,
    join: &JoinDescriptor,
    tables: &HashMap<String, Table>,
) -> PlannerResult<Vec<Row>> {
    let joined_table = tables
        .get(&join.alias)
        .unwrap_or_else(|| panic!("no table registered for join alias '{}'", join.alias));
    let (base_side, joined_side) = join.primary_condition();

    let base_values = distinct_base_values(&rows, base_side);
    let joined_rows = fetch_joined_rows(dialect, joined_table, joined_side, &base_values).await?;

    let mut buckets: HashMap<String, Vec<Row>> = HashMap::new();
    for raw in joined_rows {
        let key = raw
            .get(&joined_side.column)
            .map(value_key)
            .unwrap_or_default();
        buckets.entry(key).or_default().push(qualify(&raw, &join.alias));
    }

    Ok(merge(rows, buckets, base_side, join, joined_table))
}

/// Collect the distinct values of the base-side column already present in
/// the current merged row set, in first-seen order.
fn distinct_base_values(rows: &[Row], base_side: &ColumnRef) -> Vec<Value> {
    let mut seen = Vec::new();
    let mut keys = std::collections::HashSet::new();
    for row in rows {
        if let Some(value) = lookup(row, base_side) {
            let key = value_key(value);
            if keys.insert(key) {
                seen.push(value.clone());
            }
        }
    }
    seen
}

/// §4.5 step 2: narrow the joined-table fetch with an `IN` filter over the
/// base values, unless the joined-side column is the synthetic `id`, in
/// which case fetch the whole table.
async fn fetch_joined_rows(
    dialect: &PodDialect,
    joined_table: &Table,
    joined_side: &ColumnRef,
    base_values: &[Value],
) -> PlannerResult<Vec<Row>> {
    if joined_side.column == "id" || base_values.is_empty() {
        return Ok(dialect.select_rows(joined_table, None).await?);
    }
    let literals = base_values.iter().filter_map(value_to_literal).collect();
    let filter = in_array(ColumnRef::new(joined_side.column.clone()), literals);
    Ok(dialect.select_rows(joined_table, Some(&filter)).await?)
}

fn value_to_literal(value: &Value) -> Option<pod_query_ir::Literal> {
    match value {
        Value::String(s) => Some(pod_query_ir::Literal::String(s.clone())),
        Value::Integer(i) => Some(pod_query_ir::Literal::Integer(*i)),
        Value::Float(f) => Some(pod_query_ir::Literal::Float(*f)),
        Value::Boolean(b) => Some(pod_query_ir::Literal::Bool(*b)),
        Value::Null => None,
        Value::DateTime(dt) => Some(pod_query_ir::Literal::String(dt.to_rfc3339())),
        Value::Json(_) => None,
    }
}

/// Re-key a freshly-fetched joined row under its join alias only: `Row`'s
/// convention is bare keys for the primary alias and `alias.column` for
/// every joined column (§3 "Row"), so no bare keys survive from the
/// joined table's own fetch.
fn qualify(row: &Row, alias: &str) -> Row {
    let mut out = Row::new();
    for (key, value) in row.iter() {
        out.insert(format!("{}.{}", alias, key), value.clone());
    }
    out
}

/// Orient a join condition pair as `(base_side, joined_side)`, same
/// convention as [`JoinDescriptor::primary_condition`] but usable on any
/// entry of `join.conditions`.
fn orient<'a>(pair: &'a (ColumnRef, ColumnRef), alias: &str) -> (&'a ColumnRef, &'a ColumnRef) {
    let (left, right) = pair;
    if left.alias.as_deref() == Some(alias) {
        (right, left)
    } else {
        (left, right)
    }
}

/// Only `join.conditions[0]` drives the hash; every remaining condition is
/// checked here as a plain equality between the two already-merged rows
/// (§4.5 "Only the first condition... participates in the hash").
fn extra_conditions_match(base_row: &Row, joined_row: &Row, join: &JoinDescriptor) -> bool {
    join.conditions[1..].iter().all(|pair| {
        let (base_side, joined_side) = orient(pair, &join.alias);
        lookup(base_row, base_side).map(value_key) == lookup(joined_row, joined_side).map(value_key)
    })
}

/// §4.5 step 5: merge each base row with its bucket of joined rows. Inner
/// join drops unmatched base rows; left join emits the base row once with
/// every joined-alias column (plus `alias.id`/`alias.subject`) set to
/// `Null`. Multiple matches fan out into a Cartesian product per base row.
fn merge(
    rows: Vec<Row>,
    buckets: HashMap<String, Vec<Row>>,
    base_side: &ColumnRef,
    join: &JoinDescriptor,
    joined_table: &Table,
) -> Vec<Row> {
    let mut out = Vec::with_capacity(rows.len());
    for base_row in rows {
        let key = lookup(&base_row, base_side).map(value_key).unwrap_or_default();
        let matches: Vec<&Row> = buckets
            .get(&key)
            .map(|rows| rows.iter().filter(|r| extra_conditions_match(&base_row, r, join)).collect())
            .unwrap_or_default();
        if !matches.is_empty() {
            for joined_row in matches {
                let mut merged = base_row.clone();
                for (k, v) in joined_row.iter() {
                    merged.insert(k.clone(), v.clone());
                }
                out.push(merged);
            }
        } else if join.join_type == JoinType::Left {
            let mut merged = base_row.clone();
            merged.insert(format!("{}.id", join.alias), Value::Null);
            merged.insert(format!("{}.subject", join.alias), Value::Null);
            for col in joined_table.columns() {
                merged.insert(format!("{}.{}", join.alias, col.name), Value::Null);
            }
            out.push(merged);
        }
        // Inner join: row without a match is dropped.
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_query_ir::{Column, ColumnType};

    fn users_table() -> Table {
        Table::new(
            "users",
            "t/users/",
            "http://schema.org/Person",
            vec![
                Column::new("id", ColumnType::String).primary_key(),
                Column::new("name", ColumnType::String).required(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn qualify_produces_only_alias_qualified_keys() {
        let mut row = Row::new();
        row.insert("name", Value::String("Alice".into()));
        let qualified = qualify(&row, "users");
        assert!(qualified.get("name").is_none());
        assert_eq!(qualified.get("users.name"), Some(&Value::String("Alice".into())));
    }

    #[test]
    fn merge_inner_join_drops_unmatched_rows() {
        let join = JoinDescriptor::new(
            "posts",
            "users",
            JoinType::Inner,
            vec![(ColumnRef::qualified("posts", "authorId"), ColumnRef::qualified("users", "id"))],
        )
        .unwrap();
        let mut base = Row::new();
        base.insert("authorId", Value::String("missing".into()));
        let result = merge(vec![base], HashMap::new(), &ColumnRef::qualified("posts", "authorId"), &join, &users_table());
        assert!(result.is_empty());
    }

    #[test]
    fn merge_left_join_keeps_unmatched_rows_with_nulls() {
        let join = JoinDescriptor::new(
            "posts",
            "users",
            JoinType::Left,
            vec![(ColumnRef::qualified("posts", "authorId"), ColumnRef::qualified("users", "id"))],
        )
        .unwrap();
        let mut base = Row::new();
        base.insert("authorId", Value::String("missing".into()));
        let result = merge(vec![base], HashMap::new(), &ColumnRef::qualified("posts", "authorId"), &join, &users_table());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("users.id"), Some(&Value::Null));
        assert_eq!(result[0].get("users.name"), Some(&Value::Null));
    }

    #[test]
    fn merge_fans_out_multiple_matches() {
        let join = JoinDescriptor::new(
            "posts",
            "users",
            JoinType::Inner,
            vec![(ColumnRef::qualified("posts", "authorId"), ColumnRef::qualified("users", "id"))],
        )
        .unwrap();
        let mut base = Row::new();
        base.insert("authorId", Value::String("u1".into()));
        let mut joined_a = Row::new();
        joined_a.insert("users.name", Value::String("Alice".into()));
        let mut joined_b = Row::new();
        joined_b.insert("users.name", Value::String("Alicia".into()));
        let mut buckets = HashMap::new();
        buckets.insert(value_key(&Value::String("u1".into())), vec![joined_a, joined_b]);
        let result = merge(vec![base], buckets, &ColumnRef::qualified("posts", "authorId"), &join, &users_table());
        assert_eq!(result.len(), 2);
    }
}
