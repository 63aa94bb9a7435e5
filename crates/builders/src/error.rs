//! Error type for the fluent query builders.

use thiserror::Error;

pub type BuilderResult<T> = Result<T, BuilderError>;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Ir(#[from] pod_query_ir::IrError),
    #[error(transparent)]
    Pod(#[from] pod_query_executor::PodError),
    #[error(transparent)]
    Planner(#[from] pod_query_planner::PlannerError),
}
