//! # Literal formatting
//!
//! Turns a typed [`Value`]/[`Literal`] into the RDF literal text that goes
//! on the right-hand side of a triple or inside a `FILTER`, per §4.3's
//! per-column-type table.

use pod_query_ir::{Column, ColumnType, Literal, Value};

/// Escape `"` and `\` for a double-quoted Turtle/SPARQL string literal.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Format a row [`Value`] being written for `column`, following the
/// INSERT/UPDATE literal table in §4.3: reference-typed numeric columns
/// become an IRI, otherwise dispatch on the column's declared type.
pub fn format_value(column: &Column, value: &Value) -> String {
    if let Some(target) = &column.reference_target {
        if let Some(n) = numeric_text(value) {
            return format!("<{}/{}>", target.trim_end_matches('/'), n);
        }
    }
    match column.column_type {
        ColumnType::String => format!("\"{}\"", escape_string(&value_text(value))),
        ColumnType::Integer => numeric_text(value).unwrap_or_else(|| value_text(value)),
        ColumnType::Boolean => {
            let b = matches!(value, Value::Boolean(true))
                || matches!(value, Value::String(s) if s == "true");
            format!("\"{}\"^^xsd:boolean", b)
        }
        ColumnType::DateTime => format!(
            "\"{}\"^^xsd:dateTime",
            match value {
                Value::DateTime(dt) => dt.to_rfc3339(),
                other => escape_string(&value_text(other)),
            }
        ),
        ColumnType::Json | ColumnType::Object => {
            format!("\"{}\"^^xsd:json", escape_string(&json_text(value)))
        }
    }
}

/// Format a condition-tree [`Literal`] for use inside a `FILTER` expression.
/// Lists are rendered by the caller (`IN`/`NOT IN` need comma-separated
/// parens, not a single literal).
pub fn format_filter_literal(lit: &Literal) -> String {
    match lit {
        Literal::Null => "UNDEF".to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::String(s) => format!("\"{}\"", escape_string(s)),
        Literal::List(items) => format!(
            "({})",
            items
                .iter()
                .map(format_filter_literal)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Json(j) => j.to_string(),
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Json(j) => j.to_string(),
        other => serde_json::to_string(&value_text(other)).unwrap_or_default(),
    }
}
