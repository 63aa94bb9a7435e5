//! # Pod dialect / executor errors
//!
//! The transport and resource-lifecycle error kinds from §7: failures that
//! happen while resolving URLs, preflighting containers/resources, or
//! dispatching SPARQL over HTTP. Programmer errors raised by the IR layer
//! propagate here unchanged via [`PodError::Programmer`] so a single error
//! type covers everything a `Database` method can return.

use pod_query_ir::IrError;
use pod_query_translator::TranslateError;
use thiserror::Error;

pub type PodResult<T> = Result<T, PodError>;

#[derive(Debug, Error, Clone)]
pub enum PodError {
    #[error("cannot construct a database from a session that is not logged in")]
    NotLoggedIn,

    #[error("session has no webId; cannot derive a pod base")]
    MissingWebId,

    #[error("insert would clash with existing subject '{0}'")]
    ResourceExists(String),

    #[error("resource '{0}' was not found")]
    NotFound(String),

    #[error("transport error: {status} {status_text}: {body}")]
    Transport {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("SPARQL engine error: {0}")]
    SparqlEngine(String),

    #[error(transparent)]
    Programmer(#[from] IrError),

    #[error("translation error: {0}")]
    Translate(#[from] TranslateError),
}
