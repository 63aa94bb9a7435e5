//! # Schema model
//!
//! Tables and columns for the relational-over-RDF view of a Pod. A [`Table`]
//! owns an ordered set of [`Column`]s and binds them to an RDF class and a
//! container path; a [`Column`] binds a field name to a predicate URI.
//!
//! ## Predicate resolution
//!
//! A column's predicate is resolved in priority order: an explicit
//! `predicate`, then `namespace.uri ⧺ name`, then the built-in default
//! predicate table, then `http://example.org/<name>`. See
//! [`Column::resolve_predicate`].

use std::collections::BTreeMap;

use crate::error::{IrError, IrResult};

/// Semantic type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[non_exhaustive]
pub enum ColumnType {
    String,
    Integer,
    Boolean,
    DateTime,
    Json,
    Object,
}

/// A namespace prefix/URI pair used as a column's default predicate base.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Namespace {
    pub prefix: String,
    pub uri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }
}

/// A single column in a [`Table`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Column {
    /// Field identifier, used as the row key.
    pub name: String,
    pub column_type: ColumnType,
    /// Explicit predicate URI, highest priority in resolution.
    pub predicate: Option<String>,
    /// Advisory URI used when formatting reference-typed literals.
    pub reference_target: Option<String>,
    pub primary_key: bool,
    pub required: bool,
    pub default_value: Option<serde_json::Value>,
    /// Name of the owning table. Populated by [`Table::new`]; a back
    /// reference, not ownership.
    pub table: String,
}

impl Column {
    /// Create a column. `table` starts empty and is filled in by
    /// [`Table::new`] once the owning table is constructed.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            predicate: None,
            reference_target: None,
            primary_key: false,
            required: false,
            default_value: None,
            table: String::new(),
        }
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_reference(mut self, target: impl Into<String>) -> Self {
        self.reference_target = Some(target.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Resolve this column's predicate URI per §3's priority order.
    pub fn resolve_predicate(&self, namespace: Option<&Namespace>) -> String {
        if let Some(p) = &self.predicate {
            return p.clone();
        }
        if let Some(ns) = namespace {
            return format!("{}{}", ns.uri, self.name);
        }
        if let Some(builtin) = default_predicate(&self.name) {
            return builtin.to_string();
        }
        format!("http://example.org/{}", self.name)
    }
}

/// Built-in default predicates, used when no namespace/predicate is declared.
fn default_predicate(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("http://xmlns.com/foaf/0.1/name"),
        "title" => Some("http://purl.org/dc/elements/1.1/title"),
        "description" => Some("http://purl.org/dc/elements/1.1/description"),
        "content" => Some("http://purl.org/dc/elements/1.1/description"),
        "createdAt" => Some("http://schema.org/dateCreated"),
        "updatedAt" => Some("http://schema.org/dateModified"),
        "email" => Some("http://xmlns.com/foaf/0.1/mbox"),
        "url" => Some("http://xmlns.com/foaf/0.1/homepage"),
        "homepage" => Some("http://xmlns.com/foaf/0.1/homepage"),
        _ => None,
    }
}

/// A table: an ordered set of columns bound to an RDF class and a container.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub name: String,
    columns: BTreeMap<String, Column>,
    column_order: Vec<String>,
    /// Relative POSIX-like path, always ending in `/`.
    pub container_path: String,
    /// Absolute URI of the RDF class rows of this table belong to.
    pub rdf_class: String,
    pub namespace: Option<Namespace>,
    pub auto_register: bool,
}

impl Table {
    /// Construct a table from its name, container path, RDF class and
    /// columns. Fails if more than one column is marked `primary_key` or if
    /// `container_path` does not end with `/`.
    pub fn new(
        name: impl Into<String>,
        container_path: impl Into<String>,
        rdf_class: impl Into<String>,
        columns: Vec<Column>,
    ) -> IrResult<Self> {
        let name = name.into();
        let container_path = container_path.into();
        if !container_path.ends_with('/') {
            return Err(IrError::InvalidContainerPath(container_path));
        }

        let mut primary_keys = 0;
        let mut column_order = Vec::with_capacity(columns.len());
        let mut map = BTreeMap::new();
        for mut col in columns {
            if col.primary_key {
                primary_keys += 1;
            }
            col.table = name.clone();
            column_order.push(col.name.clone());
            map.insert(col.name.clone(), col);
        }
        if primary_keys > 1 {
            return Err(IrError::MultiplePrimaryKeys(name));
        }

        Ok(Self {
            name,
            columns: map,
            column_order,
            container_path,
            rdf_class: rdf_class.into(),
            namespace: None,
            auto_register: false,
        })
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    pub fn with_auto_register(mut self, enable: bool) -> Self {
        self.auto_register = enable;
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order.iter().filter_map(|n| self.columns.get(n))
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns().find(|c| c.primary_key)
    }
}
