//! # pod-query
//!
//! A relational-style query layer over a decentralized RDF Pod. This crate
//! is the facade (C9, §4.7): it binds a [`pod_query_executor::Session`] and
//! [`pod_query_executor::SparqlEngine`] into a [`Database`], which exposes
//! `select`/`insert`/`update`/`delete` builders and a best-effort sequential
//! `transaction` wrapper.
//!
//! Everything else — schema model, condition algebra, SPARQL rendering,
//! Pod preflight/read-modify-write, and the client-side fallback planner —
//! lives in `pod-query-ir`, `pod-query-translator`, `pod-query-executor`,
//! `pod-query-builders`, and `pod-query-planner`, and is re-exported from
//! those crates directly; `Database` is the one entry point most callers
//! need.
//!
//! ```no_run
//! # async fn run() -> pod_query::error::PodQueryResult<()> {
//! use std::sync::Arc;
//! use pod_query::Database;
//!
//! # let session: Arc<dyn pod_query_executor::Session> = todo!();
//! # let engine: Arc<dyn pod_query_executor::SparqlEngine> = todo!();
//! let db = Database::new(session, engine)?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;

pub use database::Database;
pub use error::{PodQueryError, PodQueryResult};
