//! # pod-query SPARQL translator
//!
//! Renders the operation IR (`pod-query-ir`) into SPARQL 1.1 select/update
//! text (C5, §4.3). This crate only produces strings; it never touches the
//! network or holds a session — that is `pod-query-executor`'s job, which
//! calls into this crate once it has decided an operation is renderable as
//! a single-table SPARQL statement.

pub mod error;
pub mod filter;
pub mod literal;
pub mod prefixes;
pub mod sparql;

pub use error::{TranslateError, TranslateResult};
pub use prefixes::PrefixRegistry;
pub use sparql::{requires_fallback, InsertPlan, Translator};
