//! # External collaborator contracts
//!
//! The two traits this crate consumes but never implements in production
//! code: [`Session`] (authenticated HTTP transport, DPoP-aware, opaque to
//! the core) and [`SparqlEngine`] (a SPARQL query/update engine speaking to
//! a named resource over HTTP). §6 "External interfaces" describes both;
//! `pod-query-test-utils` provides in-memory implementations for tests.

use std::collections::HashMap;

use crate::error::{PodError, PodResult};

/// An HTTP method, restricted to the verbs the Pod dialect issues (§4.4.1,
/// §4.4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Head,
    Get,
    Put,
    Post,
    Patch,
    Delete,
}

/// Request parameters for [`Session::fetch`]. Mirrors the shape of the
/// `fetch(url, init)` contract in §6: a method, headers, and an optional
/// body.
#[derive(Debug, Clone, Default)]
pub struct RequestInit<'a> {
    pub method: Option<HttpMethod>,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: Option<&'a str>,
}

impl<'a> RequestInit<'a> {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method: Some(method),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &'a str, value: &'a str) -> Self {
        self.headers.push((key, value));
        self
    }

    pub fn with_body(mut self, body: &'a str) -> Self {
        self.body = Some(body);
        self
    }
}

/// An HTTP response, as returned by [`Session::fetch`]: status, headers,
/// and a fully-buffered body. The core never streams a body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

/// Authenticated HTTP transport plus identity, consumed opaquely (§6
/// "Session contract"). The core never inspects how `fetch` authenticates;
/// it only relies on `web_id`/`is_logged_in` and the HTTP semantics of the
/// response it gets back.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    fn web_id(&self) -> Option<&str>;
    fn is_logged_in(&self) -> bool;
    async fn fetch(&self, url: &str, init: RequestInit<'_>) -> PodResult<HttpResponse>;
}

/// The RDF term kind carried by a single SPARQL binding value (§6
/// "SPARQL engine contract": `queryBindings` returns "binding maps").
#[derive(Debug, Clone, PartialEq)]
pub enum BindingValue {
    Iri(String),
    Literal { value: String, datatype: Option<String> },
    BlankNode(String),
}

impl BindingValue {
    pub fn as_str(&self) -> &str {
        match self {
            BindingValue::Iri(s) => s,
            BindingValue::Literal { value, .. } => value,
            BindingValue::BlankNode(s) => s,
        }
    }
}

/// One solution row from a `queryBindings` call: variable name → term.
pub type Binding = HashMap<String, BindingValue>;

/// A SPARQL query/update engine reached over HTTP against a named resource
/// (§6 "SPARQL engine contract"). The executor never constructs SPARQL
/// update transport itself beyond the PATCH mechanics of §4.4.5, which it
/// drives through [`Session::fetch`] directly — `update` here models an
/// engine that accepts the already-rendered statement and applies it,
/// matching engines that bundle PATCH dispatch with `queryBindings`.
#[async_trait::async_trait]
pub trait SparqlEngine: Send + Sync {
    async fn query_bindings(&self, sparql: &str, sources: &[String]) -> PodResult<Vec<Binding>>;
    async fn query_boolean(&self, sparql: &str, sources: &[String]) -> PodResult<bool>;
}

/// Convenience conversion so engine/session implementations can surface a
/// transport failure without constructing [`PodError::Transport`] by hand.
pub fn transport_error(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> PodError {
    PodError::Transport {
        status,
        status_text: status_text.into(),
        body: body.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_response_classifies_status_codes() {
        let ok = HttpResponse {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!ok.is_conflict());

        let conflict = HttpResponse {
            status: 409,
            headers: Vec::new(),
            body: String::new(),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_success());
    }

    #[test]
    fn request_init_builder_accumulates_headers() {
        let init = RequestInit::new(HttpMethod::Patch)
            .with_header("Content-Type", "application/sparql-update")
            .with_body("DELETE WHERE { ?s ?p ?o }");
        assert_eq!(init.headers.len(), 1);
        assert_eq!(init.body, Some("DELETE WHERE { ?s ?p ?o }"));
    }

    #[test]
    fn binding_value_as_str_unwraps_each_variant() {
        assert_eq!(BindingValue::Iri("http://x".into()).as_str(), "http://x");
        assert_eq!(
            BindingValue::Literal {
                value: "30".into(),
                datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into())
            }
            .as_str(),
            "30"
        );
    }
}
