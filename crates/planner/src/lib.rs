//! # pod-query fallback planner (C7)
//!
//! Executes the selects [`pod_query_executor::PodDialect::select_native`]
//! cannot handle on its own: anything with a join, a `groupBy`, or an
//! aggregate select field (§4.4.6, §4.5). The base table is still fetched
//! through the dialect's SPARQL path; everything after that — joining,
//! post-filtering, grouping, projecting, and the `distinct`/`orderBy`/
//! `offset`/`limit` modifiers — runs in memory here.

pub mod error;
pub mod group;
pub mod join;
pub mod modifiers;
pub mod normalize;
pub mod post_filter;

use std::collections::HashMap;

use pod_query_executor::PodDialect;
use pod_query_ir::{Operation, OperationKind, Row, Table};
use tracing::debug;

pub use error::{PlannerError, PlannerResult};

/// Run the full fallback pipeline for a non-native select.
///
/// `tables` must contain an entry for `op.alias` (the primary table) and
/// for every join's alias; callers (the query builders) own these
/// concrete [`Table`] values and assemble the map before calling in.
pub async fn execute_select(
    dialect: &PodDialect,
    op: &Operation,
    tables: &HashMap<String, Table>,
) -> PlannerResult<Vec<Row>> {
    let (fields, group_by, order_by, limit, offset, distinct) = match &op.kind {
        OperationKind::Select {
            fields,
            group_by,
            order_by,
            limit,
            offset,
            distinct,
        } => (fields, group_by, order_by, *limit, *offset, *distinct),
        other => panic!("execute_select called with non-select operation kind: {other:?}"),
    };

    let primary_table = tables
        .get(&op.alias)
        .unwrap_or_else(|| panic!("no table registered for primary alias '{}'", op.alias));

    let base_rows = dialect.select_rows(primary_table, op.where_.as_ref()).await?;
    debug!(alias = %op.alias, rows = base_rows.len(), "fallback base fetch");
    let seeded: Vec<Row> = base_rows.iter().map(|row| normalize::seed_row(row, &op.alias)).collect();

    let joined = join::apply_joins(dialect, seeded, &op.joins, tables).await?;
    let filtered = post_filter::apply(joined, &op.join_filters);

    let projected = if group::requires_grouping(fields, group_by) {
        group::execute(filtered, fields, group_by)?
    } else {
        filtered.iter().map(|row| normalize::project_row(row, fields)).collect()
    };

    let deduped = modifiers::apply_distinct(projected, distinct);
    let ordered = modifiers::apply_order_by(deduped, order_by);
    let paged = modifiers::apply_limit(modifiers::apply_offset(ordered, offset), limit);
    Ok(paged)
}
