//! # Translator errors
//!
//! Failures that can occur while rendering an already-validated [`Operation`]
//! into SPARQL text: a malformed condition tree, a column the target table
//! does not declare, or an aggregate that reaches the translator without the
//! column it requires (ir validation should have caught this earlier; the
//! translator re-checks defensively since it renders directly into a wire
//! format).
//!
//! [`Operation`]: pod_query_ir::Operation

use thiserror::Error;

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("operation kind does not match the requested rendering (expected {0})")]
    WrongOperationKind(&'static str),

    #[error("table '{0}' has no column '{1}'")]
    UnknownColumn(String, String),

    #[error("aggregate '{0:?}' reached the translator without a column")]
    AggregateMissingColumn(pod_query_ir::AggregateFunc),
}
