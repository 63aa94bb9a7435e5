//! # `MockSparqlEngine` (C_test1, §4.11)
//!
//! An in-memory [`SparqlEngine`] that interprets the SPARQL text the
//! translator emits against a shared [`InMemoryPod`], via
//! [`mock_query::execute_select`]. `sources` is always a single resource
//! URL in this system (the dialect never fans a query out across multiple
//! resources), so only `sources[0]` is consulted.

use async_trait::async_trait;
use pod_query_executor::{Binding, PodResult, SparqlEngine};

use crate::mock_query::execute_select;
use crate::store::{InMemoryPod, SharedPod};

pub struct MockSparqlEngine {
    pod: SharedPod,
}

impl MockSparqlEngine {
    /// An engine backed by its own fresh, empty pod. Use [`Self::with_pod`]
    /// instead when a [`crate::MockSession`] in the same test must see the
    /// writes this engine reads.
    pub fn new() -> Self {
        Self { pod: InMemoryPod::shared() }
    }

    pub fn with_pod(pod: SharedPod) -> Self {
        Self { pod }
    }
}

impl Default for MockSparqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SparqlEngine for MockSparqlEngine {
    async fn query_bindings(&self, sparql: &str, sources: &[String]) -> PodResult<Vec<Binding>> {
        let Some(url) = sources.first() else {
            return Ok(Vec::new());
        };
        let pod = self.pod.lock().unwrap();
        let triples = pod.triples(url).to_vec();
        Ok(execute_select(sparql, &triples))
    }

    async fn query_boolean(&self, sparql: &str, sources: &[String]) -> PodResult<bool> {
        Ok(!self.query_bindings(sparql, sources).await?.is_empty())
    }
}
