//! # Fallback planner errors
//!
//! Failures that can only surface once the fallback path actually runs
//! over fetched rows — a projection column outside the group-by list, an
//! aggregate with no resolvable column, or a transport failure from one of
//! the per-join-table fetches, propagated unchanged.

use thiserror::Error;

pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Debug, Error, Clone)]
pub enum PlannerError {
    #[error("projected column '{0}' is neither aggregated nor part of the group-by list")]
    MixedSelectWithoutGroupBy(String),

    #[error("aggregate function {0:?} requires a column")]
    AggregateMissingColumn(pod_query_ir::AggregateFunc),

    #[error(transparent)]
    Pod(#[from] pod_query_executor::PodError),
}
