use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pod_query_executor::{
    Binding, BindingValue, HttpMethod, HttpResponse, PodDialect, PodDialectConfig, PodError,
    RequestInit, Session, SparqlEngine,
};
use pod_query_ir::{eq, Column, ColumnType, Operation, OperationKind, RowValues, Table, Value};

fn profiles_table() -> Table {
    Table::new(
        "profiles",
        "drizzle-tests/t/",
        "http://schema.org/Person",
        vec![
            Column::new("id", ColumnType::String).primary_key(),
            Column::new("name", ColumnType::String).required(),
            Column::new("age", ColumnType::Integer),
        ],
    )
    .unwrap()
}

/// A scripted [`Session`] whose resource bodies live in a map keyed by URL,
/// and whose HEAD/PUT/PATCH responses come from a short queue of canned
/// status codes so a test can drive the 409 retry ladder deterministically.
struct FakeSession {
    resources: Mutex<HashMap<String, String>>,
    patch_statuses: Mutex<Vec<u16>>,
    put_statuses: Mutex<Vec<u16>>,
    calls: Mutex<Vec<(HttpMethod, String)>>,
}

impl FakeSession {
    fn new() -> Self {
        Self {
            resources: Mutex::new(HashMap::new()),
            patch_statuses: Mutex::new(Vec::new()),
            put_statuses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn queue_patch(self, status: u16) -> Self {
        self.patch_statuses.lock().unwrap().push(status);
        self
    }
}

#[async_trait]
impl Session for FakeSession {
    fn web_id(&self) -> Option<&str> {
        Some("https://pod.example/alice/profile/card#me")
    }

    fn is_logged_in(&self) -> bool {
        true
    }

    async fn fetch(&self, url: &str, init: RequestInit<'_>) -> pod_query_executor::PodResult<HttpResponse> {
        self.calls.lock().unwrap().push((init.method.unwrap(), url.to_string()));
        match init.method.unwrap() {
            HttpMethod::Head | HttpMethod::Get => {
                let resources = self.resources.lock().unwrap();
                match resources.get(url) {
                    Some(body) => Ok(HttpResponse {
                        status: 200,
                        headers: Vec::new(),
                        body: body.clone(),
                    }),
                    None => Ok(HttpResponse {
                        status: 404,
                        headers: Vec::new(),
                        body: String::new(),
                    }),
                }
            }
            HttpMethod::Put => {
                let status = self.put_statuses.lock().unwrap().pop().unwrap_or(201);
                if status < 300 {
                    self.resources
                        .lock()
                        .unwrap()
                        .insert(url.to_string(), init.body.unwrap_or_default().to_string());
                }
                Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
            HttpMethod::Post => {
                let mut resources = self.resources.lock().unwrap();
                let entry = resources.entry(url.to_string()).or_default();
                entry.push_str(init.body.unwrap_or_default());
                Ok(HttpResponse {
                    status: 201,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
            HttpMethod::Patch => {
                let mut statuses = self.patch_statuses.lock().unwrap();
                let status = if statuses.is_empty() { 200 } else { statuses.remove(0) };
                if status < 300 {
                    let mut resources = self.resources.lock().unwrap();
                    let entry = resources.entry(url.to_string()).or_default();
                    entry.push_str(init.body.unwrap_or_default());
                }
                Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
            HttpMethod::Delete => Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: String::new(),
            }),
        }
    }
}

/// A [`SparqlEngine`] that returns a pre-scripted set of bindings no matter
/// what text it is asked to run; fine for driving the discovery-SELECT path
/// without actually evaluating SPARQL.
struct FakeEngine {
    bindings: Vec<Binding>,
}

#[async_trait]
impl SparqlEngine for FakeEngine {
    async fn query_bindings(&self, _sparql: &str, _sources: &[String]) -> pod_query_executor::PodResult<Vec<Binding>> {
        Ok(self.bindings.clone())
    }

    async fn query_boolean(&self, _sparql: &str, _sources: &[String]) -> pod_query_executor::PodResult<bool> {
        Ok(!self.bindings.is_empty())
    }
}

fn subject_binding(subject: &str) -> Binding {
    let mut binding = Binding::new();
    binding.insert("subject".into(), BindingValue::Iri(subject.into()));
    binding
}

#[tokio::test]
async fn insert_creates_container_and_resource_then_posts_triples() {
    let session = Arc::new(FakeSession::new());
    let engine = Arc::new(FakeEngine { bindings: Vec::new() });
    let dialect = PodDialect::new(session.clone(), engine, PodDialectConfig::default()).unwrap();
    let table = profiles_table();

    let mut row = RowValues::new();
    row.insert("id".into(), Value::String("p1".into()));
    row.insert("name".into(), Value::String("Alice".into()));

    let outcomes = dialect.insert(vec![row], &table).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);

    let resource_url = dialect.resource_url(&table);
    let body = session.resources.lock().unwrap().get(&resource_url).cloned().unwrap();
    assert!(body.contains("Alice"));
}

#[tokio::test]
async fn insert_rejects_duplicate_subject_already_in_resource_body() {
    let table = profiles_table();
    let dialect_session = Arc::new(FakeSession::new());
    let engine = Arc::new(FakeEngine { bindings: Vec::new() });
    let dialect = PodDialect::new(dialect_session.clone(), engine, PodDialectConfig::default()).unwrap();

    let resource_url = dialect.resource_url(&table);
    let existing_subject = pod_query_ir::subject_uri(dialect.identity(), &table, "p1");
    dialect_session
        .resources
        .lock()
        .unwrap()
        .insert(resource_url, format!("<{}> a <http://schema.org/Person> .\n", existing_subject));

    let mut row = RowValues::new();
    row.insert("id".into(), Value::String("p1".into()));
    let err = dialect.insert(vec![row], &table).await.unwrap_err();
    assert!(matches!(err, PodError::ResourceExists(_)));
}

#[tokio::test]
async fn update_by_id_bypasses_discovery_select() {
    let table = profiles_table();
    let session = Arc::new(FakeSession::new());
    let resource_url = pod_query_ir::resource_url(
        &pod_query_ir::PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap(),
        &table,
    );
    session.resources.lock().unwrap().insert(resource_url, String::new());
    // A discovery SELECT would return this binding; since the where clause
    // is an id equality, resolve_subjects must never consult the engine.
    let engine = Arc::new(FakeEngine {
        bindings: vec![subject_binding("https://pod.example/alice/t#should-not-be-used")],
    });
    let dialect = PodDialect::new(session, engine, PodDialectConfig::default()).unwrap();

    let mut set = RowValues::new();
    set.insert("age".into(), Value::Integer(31));
    let op = Operation::update("profiles", set, eq("id", "p1"));

    let outcomes = dialect.update(&op, &table).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].subject.as_deref(), Some(pod_query_ir::subject_uri(dialect.identity(), &table, "p1").as_str()));
}

#[tokio::test]
async fn update_against_missing_resource_is_not_found() {
    let table = profiles_table();
    let session = Arc::new(FakeSession::new());
    let engine = Arc::new(FakeEngine { bindings: Vec::new() });
    let dialect = PodDialect::new(session, engine, PodDialectConfig::default()).unwrap();

    let mut set = RowValues::new();
    set.insert("age".into(), Value::Integer(31));
    let op = Operation::update("profiles", set, eq("id", "p1"));

    let err = dialect.update(&op, &table).await.unwrap_err();
    assert!(matches!(err, PodError::NotFound(_)));
}

#[tokio::test]
async fn delete_against_missing_resource_succeeds_empty() {
    let table = profiles_table();
    let session = Arc::new(FakeSession::new());
    let engine = Arc::new(FakeEngine { bindings: Vec::new() });
    let dialect = PodDialect::new(session, engine, PodDialectConfig::default()).unwrap();

    let op = Operation::delete("profiles", eq("id", "p1"));
    let outcomes = dialect.delete(&op, &table).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert!(outcomes[0].subject.is_none());
    assert_eq!(outcomes[0].status, Some(404));
}

#[tokio::test]
async fn update_discovers_subjects_by_non_id_predicate() {
    let table = profiles_table();
    let session = Arc::new(FakeSession::new());
    let resource_url = pod_query_ir::resource_url(
        &pod_query_ir::PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap(),
        &table,
    );
    session.resources.lock().unwrap().insert(resource_url, String::new());
    let found_subject = "https://pod.example/alice/t#p2";
    let engine = Arc::new(FakeEngine {
        bindings: vec![subject_binding(found_subject)],
    });
    let dialect = PodDialect::new(session, engine, PodDialectConfig::default()).unwrap();

    let mut set = RowValues::new();
    set.insert("age".into(), Value::Integer(40));
    let op = Operation::update("profiles", set, eq("name", "Bob"));

    let outcomes = dialect.update(&op, &table).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].subject.as_deref(), Some(found_subject));
}

#[tokio::test]
async fn update_retries_patch_once_on_409_before_falling_back_to_put() {
    let table = profiles_table();
    let session = Arc::new(
        FakeSession::new()
            .queue_patch(409) // the first PATCH, which fails
            .queue_patch(200), // the successful retry
    );
    let resource_url = pod_query_ir::resource_url(
        &pod_query_ir::PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap(),
        &table,
    );
    session.resources.lock().unwrap().insert(resource_url, String::new());
    let engine = Arc::new(FakeEngine { bindings: Vec::new() });
    let dialect = PodDialect::new(session.clone(), engine, PodDialectConfig::default()).unwrap();

    let mut set = RowValues::new();
    set.insert("age".into(), Value::Integer(50));
    let op = Operation::update("profiles", set, eq("id", "p1"));

    let outcomes = dialect.update(&op, &table).await.unwrap();
    assert_eq!(outcomes.len(), 1);
    let patch_calls = session
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|(m, _)| *m == HttpMethod::Patch)
        .count();
    assert_eq!(patch_calls, 2);
}

#[tokio::test]
async fn select_native_decodes_bindings_into_rows() {
    let table = profiles_table();
    let session = Arc::new(FakeSession::new());
    let mut binding = HashMap::new();
    binding.insert("subject".to_string(), BindingValue::Iri("https://pod.example/alice/t#p1".into()));
    binding.insert("name".to_string(), BindingValue::Literal { value: "Alice".into(), datatype: None });
    binding.insert(
        "age".to_string(),
        BindingValue::Literal {
            value: "30".into(),
            datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
        },
    );
    let engine = Arc::new(FakeEngine { bindings: vec![binding] });
    let dialect = PodDialect::new(session, engine, PodDialectConfig::default()).unwrap();

    let op = Operation::select("profiles");
    assert!(matches!(op.kind, OperationKind::Select { .. }));
    let rows = dialect.select_native(&op, &table).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::String("p1".into())));
    assert_eq!(rows[0].get("age"), Some(&Value::Integer(30)));
}
