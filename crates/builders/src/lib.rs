//! # pod-query fluent query builders (C4)
//!
//! Compose an [`pod_query_ir::Operation`] progressively and dispatch it
//! through [`pod_query_executor::PodDialect`] on `.execute()`, falling back
//! to [`pod_query_planner`] when the assembled operation has joins, a
//! group-by, or an aggregate select field (§4.4.6).

pub mod delete;
pub mod error;
pub mod insert;
pub mod select;
pub mod split;
pub mod update;

pub use delete::DeleteBuilder;
pub use error::{BuilderError, BuilderResult};
pub use insert::InsertBuilder;
pub use select::SelectBuilder;
pub use update::UpdateBuilder;
