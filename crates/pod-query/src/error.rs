//! Umbrella error for the `Database` facade (§4.7, §7).
//!
//! Every builder returns its own crate's error; `Database` methods and
//! `transaction()` fold them into this one type so callers at the
//! application boundary only need to match on `PodQueryError`.

use thiserror::Error;

pub type PodQueryResult<T> = Result<T, PodQueryError>;

#[derive(Debug, Error)]
pub enum PodQueryError {
    #[error(transparent)]
    Ir(#[from] pod_query_ir::IrError),
    #[error(transparent)]
    Pod(#[from] pod_query_executor::PodError),
    #[error(transparent)]
    Planner(#[from] pod_query_planner::PlannerError),
    #[error(transparent)]
    Builder(#[from] pod_query_builders::BuilderError),
}
