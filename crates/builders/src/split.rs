//! Splits a `.where()` condition tree into the part the primary SELECT can
//! carry and the part that must wait for a post-merge join filter (§4.5
//! "Post-filters"). A condition belongs to the primary side only if every
//! column it mentions is unqualified or qualified with the primary alias.

use pod_query_ir::{and, Condition, LogicalOp};
use tracing::trace;

fn is_primary(condition: &Condition, primary_alias: &str) -> bool {
    condition
        .column_refs()
        .iter()
        .all(|c| c.alias.is_none() || c.alias.as_deref() == Some(primary_alias))
}

/// Returns `(primary_condition, join_filters)`. A top-level `AND` is split
/// member-by-member; anything else (`OR`, `NOT`, a single comparison) is
/// kept whole and routed entirely to whichever side it belongs to.
pub fn split(condition: Condition, primary_alias: &str) -> (Option<Condition>, Vec<Condition>) {
    match condition {
        Condition::Logical { op: LogicalOp::And, children } => {
            let mut primary = Vec::new();
            let mut join_filters = Vec::new();
            for child in children {
                let (child_primary, mut child_filters) = split(child, primary_alias);
                primary.extend(child_primary);
                join_filters.append(&mut child_filters);
            }
            let primary = match primary.len() {
                0 => None,
                1 => primary.into_iter().next(),
                _ => Some(and(primary)),
            };
            (primary, join_filters)
        }
        other => {
            if is_primary(&other, primary_alias) {
                (Some(other), Vec::new())
            } else {
                trace!(alias = primary_alias, "where() condition routed to join-filter list");
                (None, vec![other])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_query_ir::{eq, or, ColumnRef};

    #[test]
    fn and_splits_by_alias() {
        let cond = and(vec![
            eq("age", 30i64),
            eq(ColumnRef::qualified("posts", "title"), "Hello"),
        ]);
        let (primary, filters) = split(cond, "users");
        assert!(primary.is_some());
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn non_and_with_foreign_alias_goes_entirely_to_filters() {
        let cond = or(vec![
            eq(ColumnRef::qualified("posts", "title"), "A"),
            eq(ColumnRef::qualified("posts", "title"), "B"),
        ]);
        let (primary, filters) = split(cond, "users");
        assert!(primary.is_none());
        assert_eq!(filters.len(), 1);
    }

    #[test]
    fn plain_equality_on_primary_alias_stays_primary() {
        let cond = eq("age", 30i64);
        let (primary, filters) = split(cond, "users");
        assert!(primary.is_some());
        assert!(filters.is_empty());
    }
}
