//! Testing utilities for pod-query
//!
//! This crate provides common testing components shared across the
//! workspace:
//! - [`MockSession`] — an in-memory [`pod_query_executor::Session`] backed by
//!   a Turtle-aware [`store::InMemoryPod`]
//! - [`MockSparqlEngine`] — an in-memory [`pod_query_executor::SparqlEngine`]
//!   that interprets the SPARQL subset the translator emits
//! - [`fixtures`] — shared table schemas used across builder/facade tests

pub mod fixtures;
pub mod mock_engine;
mod mock_query;
pub mod session;
pub mod store;

pub use mock_engine::MockSparqlEngine;
pub use session::MockSession;
pub use store::{InMemoryPod, SharedPod};
