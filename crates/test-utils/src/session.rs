//! # `MockSession` (C_test1, §4.11)
//!
//! An in-memory [`Session`] that dispatches HEAD/GET/PUT/POST/PATCH
//! against a shared [`InMemoryPod`], the way a real Solid session would
//! against a Pod server — minus the network.

use async_trait::async_trait;
use pod_query_executor::{HttpMethod, HttpResponse, PodResult, RequestInit, Session};

use crate::store::{InMemoryPod, SharedPod};

pub struct MockSession {
    pod: SharedPod,
    web_id: Option<String>,
    logged_in: bool,
}

impl MockSession {
    /// A session authenticated as `web_id`, backed by a fresh, empty pod.
    /// Matches what `PodDialect::new` needs: `is_logged_in() == true` and
    /// a parseable webId.
    pub fn logged_in(web_id: impl Into<String>) -> Self {
        Self { pod: InMemoryPod::shared(), web_id: Some(web_id.into()), logged_in: true }
    }

    /// An unauthenticated session, for exercising the facade's
    /// construction-time rejection (§4.7, §7).
    pub fn anonymous() -> Self {
        Self { pod: InMemoryPod::shared(), web_id: None, logged_in: false }
    }

    /// A session sharing an existing pod, so a [`MockSparqlEngine`] built
    /// from the same pod can see what this session writes.
    ///
    /// [`MockSparqlEngine`]: crate::MockSparqlEngine
    pub fn with_pod(pod: SharedPod, web_id: impl Into<String>) -> Self {
        Self { pod, web_id: Some(web_id.into()), logged_in: true }
    }

    pub fn pod(&self) -> SharedPod {
        self.pod.clone()
    }
}

fn header<'a>(init: &'a RequestInit<'a>, name: &str) -> Option<&'a str> {
    init.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| *v)
}

#[async_trait]
impl Session for MockSession {
    fn web_id(&self) -> Option<&str> {
        self.web_id.as_deref()
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    async fn fetch(&self, url: &str, init: RequestInit<'_>) -> PodResult<HttpResponse> {
        let method = init.method.unwrap_or(HttpMethod::Get);
        let mut pod = self.pod.lock().unwrap();
        match method {
            HttpMethod::Head => {
                let status = if pod.container_exists(url) || pod.resource_exists(url) { 200 } else { 404 };
                Ok(HttpResponse { status, headers: Vec::new(), body: String::new() })
            }
            HttpMethod::Get => {
                if pod.resource_exists(url) {
                    Ok(HttpResponse { status: 200, headers: Vec::new(), body: pod.serialized_body(url) })
                } else if pod.container_exists(url) {
                    Ok(HttpResponse { status: 200, headers: Vec::new(), body: String::new() })
                } else {
                    Ok(HttpResponse { status: 404, headers: Vec::new(), body: String::new() })
                }
            }
            HttpMethod::Put => {
                if header(&init, "Link").is_some_and(|v| v.contains("BasicContainer")) {
                    pod.create_container(url);
                } else if header(&init, "Content-Type") == Some("application/sparql-update") {
                    pod.apply_update(url, init.body.unwrap_or_default());
                } else {
                    pod.create_resource(url);
                }
                Ok(HttpResponse { status: 201, headers: Vec::new(), body: String::new() })
            }
            HttpMethod::Post => {
                pod.insert_data(url, init.body.unwrap_or_default());
                Ok(HttpResponse { status: 201, headers: Vec::new(), body: String::new() })
            }
            HttpMethod::Patch => {
                pod.apply_update(url, init.body.unwrap_or_default());
                Ok(HttpResponse { status: 200, headers: Vec::new(), body: String::new() })
            }
            HttpMethod::Delete => Ok(HttpResponse { status: 200, headers: Vec::new(), body: String::new() }),
        }
    }
}
