//! # SPARQL 1.1 statement rendering
//!
//! The translator (C5): turns an already-built [`Operation`] plus its
//! target [`Table`] into SPARQL 1.1 select/update text, per §4.3. Joins
//! never reach this module — the executor only calls it with single-table
//! operations, either because the request is engine-native (no joins/
//! group-by/aggregates) or because it has already been reduced to a plain
//! column-select of the primary table for the fallback path (§4.4.6).

use pod_query_ir::{
    Aggregate, AggregateFunc, Condition, JoinDescriptor, Operation, OperationKind, OrderBy,
    PodIdentity, RowValues, SelectField, Table, Value,
};

use crate::error::{TranslateError, TranslateResult};
use crate::filter::render_condition;
use crate::literal::format_value;
use crate::prefixes::PrefixRegistry;

/// The result of rendering an INSERT: the statement text plus the subject
/// URI assigned to each input row, in order (needed by the executor for
/// the duplicate-subject scan in §4.4.2).
#[derive(Debug, Clone)]
pub struct InsertPlan {
    pub sparql: String,
    pub subjects: Vec<String>,
}

/// Renders IR operations into SPARQL text. Holds the mutable prefix
/// registry (§9 "Named prefixes registry"); additions via
/// [`Translator::add_prefix`] take effect for every statement rendered
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    prefixes: PrefixRegistry,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_prefix(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.add(prefix, uri);
    }

    fn prefix_block(&self) -> String {
        self.prefixes.render()
    }

    /// Render a `select` operation's IR into a complete SPARQL SELECT
    /// statement, per §4.3. `joins` must be empty; the executor strips
    /// joins before calling this (§4.4.6).
    pub fn render_select(
        &self,
        op: &Operation,
        table: &Table,
        identity: &PodIdentity,
    ) -> TranslateResult<String> {
        let (fields, group_by, order_by, limit, offset, distinct) = match &op.kind {
            OperationKind::Select {
                fields,
                group_by,
                order_by,
                limit,
                offset,
                distinct,
            } => (fields, group_by, order_by, *limit, *offset, *distinct),
            _ => return Err(TranslateError::WrongOperationKind("select")),
        };

        let effective_fields = default_fields_if_empty(fields, table);
        let include_subject = group_by.is_empty()
            && !effective_fields
                .iter()
                .any(|(_, f)| matches!(f, SelectField::Aggregate(_)));

        let select_clause =
            render_select_clause(&effective_fields, distinct, include_subject)?;
        let body = self.render_body(op.where_.as_ref(), table, identity)?;

        let mut text = format!("{}{} WHERE {{\n{}}}", self.prefix_block(), select_clause, body);
        if !group_by.is_empty() {
            let cols: Vec<String> = group_by.iter().map(|c| format!("?{}", c.column)).collect();
            text.push_str(&format!("\nGROUP BY {}", cols.join(" ")));
        }
        if !order_by.is_empty() {
            text.push_str(&format!("\nORDER BY {}", render_order_by(order_by)));
        }
        if let Some(limit) = limit {
            text.push_str(&format!("\nLIMIT {}", limit));
        }
        if let Some(offset) = offset {
            text.push_str(&format!("\nOFFSET {}", offset));
        }
        Ok(text)
    }

    /// Render the `SELECT ?subject WHERE {...}` discovery query used by the
    /// read-modify-write path for conditional update/delete (§4.4.3/4.4.4).
    pub fn render_subject_discovery(
        &self,
        where_: &Condition,
        table: &Table,
        identity: &PodIdentity,
    ) -> TranslateResult<String> {
        let body = self.render_body(Some(where_), table, identity)?;
        Ok(format!(
            "{}SELECT ?subject WHERE {{\n{}}}",
            self.prefix_block(),
            body
        ))
    }

    fn render_body(
        &self,
        where_: Option<&Condition>,
        table: &Table,
        identity: &PodIdentity,
    ) -> TranslateResult<String> {
        let mut body = String::new();
        for col in table.columns() {
            if col.name == "id" {
                continue;
            }
            let predicate = col.resolve_predicate(table.namespace.as_ref());
            let var = format!("?{}", col.name);
            if col.required {
                body.push_str(&format!("  ?subject <{}> {} .\n", predicate, var));
            } else {
                body.push_str(&format!("  OPTIONAL {{ ?subject <{}> {} . }}\n", predicate, var));
            }
        }
        body.push_str(&format!("  ?subject a <{}> .\n", table.rdf_class));
        if let Some(cond) = where_ {
            body.push_str(&format!(
                "  FILTER ({})\n",
                render_condition(cond, table, identity)
            ));
        }
        Ok(body)
    }

    /// Render an `insert` operation's rows into an `INSERT DATA` statement,
    /// assigning a subject URI per row (an explicit `id` field, or a
    /// timestamp-derived one per §3 "Resource URL conventions").
    pub fn render_insert(&self, rows: &[RowValues], table: &Table, identity: &PodIdentity) -> TranslateResult<InsertPlan> {
        let mut subjects = Vec::with_capacity(rows.len());
        let mut triples = String::new();
        for row in rows {
            let id = match row.get("id") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Integer(n)) => n.to_string(),
                _ => pod_query_ir::synthesize_id(),
            };
            let subject = pod_query_ir::subject_uri(identity, table, &id);
            triples.push_str(&format!("<{}> a <{}> .\n", subject, table.rdf_class));
            for col in table.columns() {
                if col.name == "id" {
                    continue;
                }
                if let Some(value) = row.get(&col.name) {
                    if value.is_null() {
                        continue;
                    }
                    let predicate = col.resolve_predicate(table.namespace.as_ref());
                    let literal = format_value(col, value);
                    triples.push_str(&format!("<{}> <{}> {} .\n", subject, predicate, literal));
                }
            }
            subjects.push(subject);
        }
        let sparql = format!("{}INSERT DATA {{\n{}}}", self.prefix_block(), triples);
        Ok(InsertPlan { sparql, subjects })
    }

    /// Render the native UPDATE template for a single known subject (§4.3):
    /// one `DELETE WHERE` per updated predicate, then one `INSERT DATA` for
    /// the non-null new values, separated by `;`.
    pub fn render_update_for_subject(
        &self,
        subject: &str,
        table: &Table,
        set: &RowValues,
    ) -> TranslateResult<String> {
        let mut statements = Vec::new();
        for (index, column_name) in set.keys().enumerate() {
            let column = table
                .column(column_name)
                .ok_or_else(|| TranslateError::UnknownColumn(table.name.clone(), column_name.clone()))?;
            let predicate = column.resolve_predicate(table.namespace.as_ref());
            statements.push(format!(
                "DELETE WHERE {{ <{}> <{}> ?old{} . }}",
                subject, predicate, index
            ));
        }

        let mut insert_triples = String::new();
        for (column_name, value) in set {
            if value.is_null() {
                continue;
            }
            let column = table
                .column(column_name)
                .ok_or_else(|| TranslateError::UnknownColumn(table.name.clone(), column_name.clone()))?;
            let predicate = column.resolve_predicate(table.namespace.as_ref());
            let literal = format_value(column, value);
            insert_triples.push_str(&format!("<{}> <{}> {} .\n", subject, predicate, literal));
        }
        if !insert_triples.is_empty() {
            statements.push(format!("INSERT DATA {{\n{}}}", insert_triples));
        }

        Ok(format!("{}{}", self.prefix_block(), statements.join(";\n")))
    }

    /// Render the native DELETE template (§4.3): a single-subject delete
    /// when `where_` narrows to one known subject, otherwise a class-scoped
    /// delete of every triple whose subject is an instance of the table's
    /// RDF class.
    pub fn render_delete_for_subject(&self, subject: &str) -> String {
        format!(
            "{}DELETE WHERE {{ <{}> ?p ?o . }}",
            self.prefix_block(),
            subject
        )
    }

    pub fn render_delete_by_class(&self, table: &Table) -> String {
        format!(
            "{}DELETE WHERE {{ ?subject a <{}> . ?subject ?p ?o . }}",
            self.prefix_block(),
            table.rdf_class
        )
    }
}

fn default_fields_if_empty(
    fields: &[(String, SelectField)],
    table: &Table,
) -> Vec<(String, SelectField)> {
    if !fields.is_empty() {
        return fields.to_vec();
    }
    table
        .columns()
        .filter(|c| c.name != "id")
        .map(|c| {
            (
                c.name.clone(),
                SelectField::Column(pod_query_ir::ColumnRef::new(c.name.clone())),
            )
        })
        .collect()
}

fn render_select_clause(
    fields: &[(String, SelectField)],
    distinct: bool,
    include_subject: bool,
) -> TranslateResult<String> {
    let mut parts = Vec::new();
    if include_subject {
        parts.push("?subject".to_string());
    }
    for (alias, field) in fields {
        parts.push(render_field_expr(alias, field)?);
    }
    let distinct_kw = if distinct { "DISTINCT " } else { "" };
    Ok(format!("SELECT {}{}", distinct_kw, parts.join(" ")))
}

fn render_field_expr(alias: &str, field: &SelectField) -> TranslateResult<String> {
    match field {
        SelectField::Column(column) => {
            if column.column == alias {
                Ok(format!("?{}", column.column))
            } else {
                Ok(format!("(?{} AS ?{})", column.column, alias))
            }
        }
        SelectField::Aggregate(agg) => render_aggregate_expr(alias, agg),
    }
}

fn render_aggregate_expr(alias: &str, agg: &Aggregate) -> TranslateResult<String> {
    let distinct = if agg.distinct { "DISTINCT " } else { "" };
    let func_name = match agg.func {
        AggregateFunc::Count => "COUNT",
        AggregateFunc::Sum => "SUM",
        AggregateFunc::Avg => "AVG",
        AggregateFunc::Min => "MIN",
        AggregateFunc::Max => "MAX",
    };
    let operand = match &agg.column {
        Some(column) => format!("?{}", column.column),
        None if agg.func == AggregateFunc::Count => "*".to_string(),
        None => return Err(TranslateError::AggregateMissingColumn(agg.func)),
    };
    Ok(format!("({}({}{}) AS ?{})", func_name, distinct, operand, alias))
}

fn render_order_by(order_by: &[OrderBy]) -> String {
    order_by
        .iter()
        .map(|o| {
            if o.descending {
                format!("DESC(?{})", o.column.column)
            } else {
                format!("?{}", o.column.column)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `joins` is non-empty, a convenience guard for callers that must
/// reject rendering against a multi-table operation (§9 design note:
/// "translator must not see joins").
pub fn requires_fallback(joins: &[JoinDescriptor]) -> bool {
    !joins.is_empty()
}
