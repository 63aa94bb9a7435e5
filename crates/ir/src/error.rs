//! # Programmer errors for the IR layer
//!
//! These are the *programmer-error* kind from the system's error design:
//! misuse that should fail synchronously at construction or build time,
//! never as a transport failure.

use thiserror::Error;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("table '{0}' declares more than one primary key column")]
    MultiplePrimaryKeys(String),

    #[error("container path '{0}' must end with '/'")]
    InvalidContainerPath(String),

    #[error("aggregate function '{0:?}' requires a column")]
    AggregateMissingColumn(crate::aggregate::AggregateFunc),

    #[error("limit must be a non-negative integer, got {0}")]
    NegativeLimit(i64),

    #[error("offset must be a non-negative integer, got {0}")]
    NegativeOffset(i64),

    #[error("join condition list must not be empty")]
    EmptyJoinCondition,

    #[error("join type '{0}' is not supported; only innerJoin and leftJoin are allowed")]
    UnsupportedJoinType(String),

    #[error(
        "join condition '{0}' does not reference the new alias '{1}' on exactly one side"
    )]
    JoinConditionMissingAlias(String, String),

    #[error(
        "select list mixes aggregates with non-aggregate column '{0}' that is not in groupBy"
    )]
    MixedSelectWithoutGroupBy(String),

    #[error("update requires a where clause")]
    UpdateWithoutWhere,

    #[error("batch insert contains duplicate id '{0}'")]
    DuplicateInsertId(String),
}
