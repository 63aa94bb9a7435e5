//! # pod-query executor
//!
//! The Pod dialect (C6): turns an already-translated operation into HTTP
//! traffic against a Solid-style Pod, and owns everything that traffic
//! touches — container/resource preflight, the read-modify-write path for
//! conditional update/delete, the §4.4.5 PATCH retry ladder, and the
//! wire-facing half of result normalization (binding maps to typed rows).
//!
//! [`Session`] and [`SparqlEngine`] are the two contracts this crate
//! consumes but never implements outside tests; `pod-query-test-utils`
//! provides in-memory versions of both.

pub mod cache;
pub mod config;
pub mod dialect;
pub mod error;
pub mod normalize;
pub mod r#trait;

pub use config::PodDialectConfig;
pub use dialect::{PodDialect, WriteOutcome};
pub use error::{PodError, PodResult};
pub use normalize::{binding_to_row, bindings_to_rows, decode_binding_value};
pub use r#trait::{
    transport_error, Binding, BindingValue, HttpMethod, HttpResponse, RequestInit, Session,
    SparqlEngine,
};
