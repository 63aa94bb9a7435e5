//! # Pod dialect / executor (C6)
//!
//! The hard center of the system (§4.4): resolves container/resource URLs
//! from a session's webId, preflights their existence, orchestrates insert
//! and the read-modify-write path for conditional update/delete, and
//! drives the §4.4.5 PATCH/retry ladder. [`PodDialect`] holds the one
//! piece of process-wide state the system has — the response cache (§5).

use std::sync::{Arc, Mutex};

use pod_query_ir::{
    resource_url as ir_resource_url, subject_uri, BinaryOp, Condition, Literal, Operation,
    OperationKind, PodIdentity, Row, RowValues, Table,
};
use pod_query_translator::Translator;
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;
use crate::config::PodDialectConfig;
use crate::error::{PodError, PodResult};
use crate::normalize::bindings_to_rows;
use crate::r#trait::{HttpMethod, RequestInit, Session, SparqlEngine};

/// The result of one insert/update/delete statement against one subject,
/// mirroring §6's `{success, source, subject?, status?}` response shape.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub success: bool,
    pub source: String,
    pub subject: Option<String>,
    pub status: Option<u16>,
}

pub struct PodDialect {
    session: Arc<dyn Session>,
    engine: Arc<dyn SparqlEngine>,
    translator: Translator,
    identity: PodIdentity,
    config: PodDialectConfig,
    cache: Mutex<ResponseCache>,
}

impl PodDialect {
    /// Construct a dialect bound to `session` for its lifetime. Fails with
    /// [`PodError::NotLoggedIn`]/[`PodError::MissingWebId`] per §4.7's
    /// facade-construction contract, even though this type sits one layer
    /// below the facade — both layers must refuse an unauthenticated
    /// session, and the dialect is where the webId is actually parsed.
    pub fn new(
        session: Arc<dyn Session>,
        engine: Arc<dyn SparqlEngine>,
        config: PodDialectConfig,
    ) -> PodResult<Self> {
        if !session.is_logged_in() {
            return Err(PodError::NotLoggedIn);
        }
        let web_id = session.web_id().ok_or(PodError::MissingWebId)?;
        let identity = PodIdentity::from_web_id(web_id).ok_or(PodError::MissingWebId)?;
        Ok(Self {
            session,
            engine,
            translator: Translator::new(),
            identity,
            config,
            cache: Mutex::new(ResponseCache::default()),
        })
    }

    pub fn identity(&self) -> &PodIdentity {
        &self.identity
    }

    /// Register an additional SPARQL prefix for every statement rendered
    /// from here on (§9 "Named prefixes registry").
    pub fn add_prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.translator.add_prefix(prefix, uri);
    }

    pub fn container_url(&self, table: &Table) -> String {
        pod_query_ir::container_url(&self.identity, table)
    }

    pub fn resource_url(&self, table: &Table) -> String {
        ir_resource_url(&self.identity, table)
    }

    async fn head(&self, url: &str) -> PodResult<crate::r#trait::HttpResponse> {
        self.session.fetch(url, RequestInit::new(HttpMethod::Head)).await
    }

    /// §4.4.1 step 1: HEAD the container, PUT an empty `BasicContainer` on
    /// 404, treat a 409 on that PUT as "already exists".
    async fn ensure_container(&self, table: &Table) -> PodResult<()> {
        let url = self.container_url(table);
        debug!(container_url = %url, "preflight: container");
        let head = self.head(&url).await?;
        if head.status != 404 {
            return Ok(());
        }
        let init = RequestInit::new(HttpMethod::Put)
            .with_header("Link", "<http://www.w3.org/ns/ldp#BasicContainer>; rel=\"type\"");
        let put = self.session.fetch(&url, init).await?;
        if put.is_success() || put.status == 409 {
            info!(container_url = %url, "created container");
            return Ok(());
        }
        Err(PodError::Transport {
            status: put.status,
            status_text: String::new(),
            body: put.body,
        })
    }

    /// §4.4.1 step 2 / §7: HEAD the resource; 401/403 are treated as
    /// "exists" so they surface as the real failure later instead of a
    /// spurious `NotFound`. A 405 triggers a GET-based existence check.
    async fn resource_exists_for_write(&self, table: &Table) -> PodResult<bool> {
        let url = self.resource_url(table);
        let head = self.head(&url).await?;
        match head.status {
            200..=299 => Ok(true),
            404 => Ok(false),
            401 | 403 => Ok(true),
            405 => {
                let get = self.session.fetch(&url, RequestInit::new(HttpMethod::Get)).await?;
                Ok(get.status != 404)
            }
            status => Err(PodError::Transport {
                status,
                status_text: String::new(),
                body: head.body,
            }),
        }
    }

    async fn ensure_resource_for_insert(&self, table: &Table) -> PodResult<()> {
        self.ensure_container(table).await?;
        if self.resource_exists_for_write(table).await? {
            return Ok(());
        }
        let url = self.resource_url(table);
        let put = self
            .session
            .fetch(
                &url,
                RequestInit::new(HttpMethod::Put)
                    .with_header("Content-Type", "text/turtle")
                    .with_body(""),
            )
            .await?;
        if !put.is_success() && put.status != 409 {
            return Err(PodError::Transport {
                status: put.status,
                status_text: String::new(),
                body: put.body,
            });
        }
        info!(resource_url = %url, "created resource");
        Ok(())
    }

    async fn get_resource_body(&self, table: &Table) -> PodResult<String> {
        let url = self.resource_url(table);
        if let Some(cached) = self.cache.lock().unwrap().get(&url, self.config.cache_ttl) {
            return Ok(cached);
        }
        let get = self
            .session
            .fetch(&url, RequestInit::new(HttpMethod::Get).with_header("Accept", "text/turtle"))
            .await?;
        if get.status == 404 {
            return Ok(String::new());
        }
        if !get.is_success() {
            return Err(PodError::Transport {
                status: get.status,
                status_text: String::new(),
                body: get.body,
            });
        }
        self.cache.lock().unwrap().insert(url, get.body.clone());
        Ok(get.body)
    }

    fn invalidate_cache(&self, url: &str) {
        self.cache.lock().unwrap().invalidate(url);
        debug!(url, "cache invalidated after write");
    }

    /// §4.4.5: PATCH the resource with the rendered update text; on 409,
    /// replay the identical PATCH once, then fall back to PUT with the
    /// same body once. Any success invalidates the cache entry.
    async fn dispatch_update(&self, url: &str, sparql_update: &str) -> PodResult<()> {
        let send = |method: HttpMethod| {
            RequestInit::new(method)
                .with_header("Content-Type", "application/sparql-update")
                .with_body(sparql_update)
        };
        let resp = self.session.fetch(url, send(HttpMethod::Patch)).await?;
        if resp.is_success() {
            self.invalidate_cache(url);
            return Ok(());
        }
        if resp.status == 409 && self.config.retry_409 {
            warn!(url, "409 on PATCH, replaying once");
            let retry = self.session.fetch(url, send(HttpMethod::Patch)).await?;
            if retry.is_success() {
                self.invalidate_cache(url);
                return Ok(());
            }
            warn!(url, "replay PATCH failed, falling back to PUT");
            let put = self.session.fetch(url, send(HttpMethod::Put)).await?;
            if put.is_success() {
                self.invalidate_cache(url);
                return Ok(());
            }
            return Err(PodError::Transport {
                status: put.status,
                status_text: String::new(),
                body: put.body,
            });
        }
        Err(PodError::Transport {
            status: resp.status,
            status_text: String::new(),
            body: resp.body,
        })
    }

    /// Dispatch a select that is already known to be engine-native: no
    /// joins, no group-by, no aggregates (§4.4.6). The rendered SPARQL
    /// already projects to output-alias variable names, so the decoded
    /// rows need no further alias resolution.
    pub async fn select_native(&self, op: &Operation, table: &Table) -> PodResult<Vec<Row>> {
        let sparql = self.translator.render_select(op, table, &self.identity)?;
        let url = self.resource_url(table);
        let bindings = self.engine.query_bindings(&sparql, &[url]).await?;
        Ok(bindings_to_rows(bindings))
    }

    /// Plain column-select of `table` filtered by `where_`, with no
    /// projection/distinct/limit/offset/order applied (§4.4.6's fallback
    /// base fetch, and §4.5 step 2's per-join-table fetch).
    pub async fn select_rows(&self, table: &Table, where_: Option<&Condition>) -> PodResult<Vec<Row>> {
        let mut op = Operation::select(&table.name);
        op.where_ = where_.cloned();
        let sparql = self.translator.render_select(&op, table, &self.identity)?;
        let url = self.resource_url(table);
        let bindings = self.engine.query_bindings(&sparql, &[url]).await?;
        Ok(bindings_to_rows(bindings))
    }

    /// §4.4.2: ensure container+resource, scan for a duplicate subject,
    /// translate and POST the `INSERT DATA` statement.
    pub async fn insert(&self, rows: Vec<RowValues>, table: &Table) -> PodResult<Vec<WriteOutcome>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_resource_for_insert(table).await?;
        let plan = self.translator.render_insert(&rows, table, &self.identity)?;

        if self.config.duplicate_id_scan {
            let body = self.get_resource_body(table).await?;
            for subject in &plan.subjects {
                if body.contains(subject.as_str()) {
                    return Err(PodError::ResourceExists(subject.clone()));
                }
            }
        }

        let url = self.resource_url(table);
        let init = RequestInit::new(HttpMethod::Post)
            .with_header("Content-Type", "application/sparql-update")
            .with_body(&plan.sparql);
        let resp = self.session.fetch(&url, init).await?;
        if !resp.is_success() {
            return Err(PodError::Transport {
                status: resp.status,
                status_text: String::new(),
                body: resp.body,
            });
        }
        self.invalidate_cache(&url);
        Ok(plan
            .subjects
            .into_iter()
            .map(|subject| WriteOutcome {
                success: true,
                source: url.clone(),
                subject: Some(subject),
                status: Some(resp.status),
            })
            .collect())
    }

    /// §4.4.3: if `where_` reduces to an `id` equality/`IN`, skip the
    /// discovery SELECT and update the known subject(s) directly.
    /// Otherwise discover matching subjects first, then update each in
    /// registration order, sequentially, with no rollback.
    pub async fn update(&self, op: &Operation, table: &Table) -> PodResult<Vec<WriteOutcome>> {
        let set = match &op.kind {
            OperationKind::Update { set } => set,
            _ => return Err(PodError::Programmer(pod_query_ir::IrError::UpdateWithoutWhere)),
        };
        let where_ = op
            .where_
            .as_ref()
            .ok_or(PodError::Programmer(pod_query_ir::IrError::UpdateWithoutWhere))?;

        if !self.resource_exists_for_write(table).await? {
            return Err(PodError::NotFound(self.resource_url(table)));
        }

        let url = self.resource_url(table);
        let subjects = self.resolve_subjects(where_, table, &url).await?;

        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let sparql = self.translator.render_update_for_subject(&subject, table, set)?;
            self.dispatch_update(&url, &sparql).await?;
            outcomes.push(WriteOutcome {
                success: true,
                source: url.clone(),
                subject: Some(subject),
                status: Some(200),
            });
        }
        Ok(outcomes)
    }

    /// §4.4.4: same discovery strategy as update, but a missing resource is
    /// a silent no-op (success-empty) rather than a hard `NotFound`.
    pub async fn delete(&self, op: &Operation, table: &Table) -> PodResult<Vec<WriteOutcome>> {
        let where_ = op
            .where_
            .as_ref()
            .ok_or(PodError::Programmer(pod_query_ir::IrError::UpdateWithoutWhere))?;
        let url = self.resource_url(table);

        if !self.resource_exists_for_write(table).await? {
            return Ok(vec![WriteOutcome {
                success: true,
                source: url,
                subject: None,
                status: Some(404),
            }]);
        }

        let subjects = self.resolve_subjects(where_, table, &url).await?;
        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let sparql = self.translator.render_delete_for_subject(&subject);
            self.dispatch_update(&url, &sparql).await?;
            outcomes.push(WriteOutcome {
                success: true,
                source: url.clone(),
                subject: Some(subject),
                status: Some(200),
            });
        }
        Ok(outcomes)
    }

    /// Resolve the subjects a conditional update/delete targets: bypass
    /// the discovery SELECT when `where_` is already an `id`
    /// equality/`IN` (§4.4.3 last paragraph), otherwise run the discovery
    /// query and read back `?subject` bindings in result order.
    async fn resolve_subjects(&self, where_: &Condition, table: &Table, url: &str) -> PodResult<Vec<String>> {
        if let Some(ids) = id_bypass(where_) {
            return Ok(ids
                .iter()
                .map(|id| subject_uri(&self.identity, table, id))
                .collect());
        }
        let discovery = self.translator.render_subject_discovery(where_, table, &self.identity)?;
        let bindings = self.engine.query_bindings(&discovery, std::slice::from_ref(&url.to_string())).await?;
        Ok(bindings
            .into_iter()
            .filter_map(|binding| binding.get("subject").map(|v| v.as_str().to_string()))
            .collect())
    }
}

/// If `where_` is exactly an `id = x` or `id IN [..]` condition, return the
/// literal ids it names so the caller can skip the discovery SELECT.
fn id_bypass(where_: &Condition) -> Option<Vec<String>> {
    match where_ {
        Condition::Binary { column, op, value } if column.column == "id" => match op {
            BinaryOp::Eq => Some(vec![literal_as_id(value)]),
            BinaryOp::In => Some(match value {
                Literal::List(items) => items.iter().map(literal_as_id).collect(),
                other => vec![literal_as_id(other)],
            }),
            _ => None,
        },
        _ => None,
    }
}

fn literal_as_id(lit: &Literal) -> String {
    match lit {
        Literal::String(s) => s.clone(),
        Literal::Integer(i) => i.to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_query_ir::{eq, in_array};

    #[test]
    fn id_bypass_recognizes_equality() {
        let ids = id_bypass(&eq("id", "p1")).unwrap();
        assert_eq!(ids, vec!["p1".to_string()]);
    }

    #[test]
    fn id_bypass_recognizes_in_list() {
        let ids = id_bypass(&in_array("id", vec![Literal::String("a".into()), Literal::String("b".into())])).unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn id_bypass_rejects_non_id_column() {
        assert!(id_bypass(&eq("age", 30i64)).is_none());
    }
}
