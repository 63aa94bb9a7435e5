//! # Binding decoding
//!
//! Converts the raw [`Binding`] maps a [`SparqlEngine`] returns into typed
//! [`Row`]s, per §4.6's datatype table. This is the wire-facing half of the
//! result normalizer (C8); alias/projection resolution over already-typed
//! rows is `pod-query-planner`'s job, since it applies identically whether
//! the rows came from a native SELECT or a fallback per-table fetch.
//!
//! [`SparqlEngine`]: crate::SparqlEngine

use pod_query_ir::{id_from_subject, Row, Value};

use crate::r#trait::{Binding, BindingValue};

const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const XSD_JSON: &str = "http://www.w3.org/2001/XMLSchema#json";

/// Decode one bound term per its RDF datatype (§4.6): `xsd:integer` →
/// integer, `xsd:decimal`/`double` → float, `xsd:boolean` → boolean,
/// `xsd:dateTime` → an instant, `xsd:json` → a parsed JSON value,
/// everything else (including bare IRIs and blank nodes) → string.
pub fn decode_binding_value(value: &BindingValue) -> Value {
    match value {
        BindingValue::Iri(iri) => Value::String(iri.clone()),
        BindingValue::BlankNode(id) => Value::String(format!("_:{}", id)),
        BindingValue::Literal { value, datatype } => match datatype.as_deref() {
            Some(XSD_INTEGER) => value
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::String(value.clone())),
            Some(XSD_DECIMAL) | Some(XSD_DOUBLE) => value
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::String(value.clone())),
            Some(XSD_BOOLEAN) => match value.as_str() {
                "true" | "1" => Value::Boolean(true),
                "false" | "0" => Value::Boolean(false),
                _ => Value::String(value.clone()),
            },
            Some(XSD_DATETIME) => chrono::DateTime::parse_from_rfc3339(value)
                .map(|dt| Value::DateTime(dt.with_timezone(&chrono::Utc)))
                .unwrap_or_else(|_| Value::String(value.clone())),
            Some(XSD_JSON) => serde_json::from_str(value)
                .map(Value::Json)
                .unwrap_or_else(|_| Value::String(value.clone())),
            _ => Value::String(value.clone()),
        },
    }
}

/// Convert one SPARQL solution into a [`Row`]: every bound variable becomes
/// a cell, and a bound `?subject` additionally derives `id` via
/// [`id_from_subject`].
pub fn binding_to_row(binding: &Binding) -> Row {
    let mut row = Row::new();
    for (var, value) in binding {
        let decoded = decode_binding_value(value);
        if var == "subject" {
            if let Value::String(iri) = &decoded {
                row.insert("id", Value::String(id_from_subject(iri)));
            }
        }
        row.insert(var.clone(), decoded);
    }
    row
}

pub fn bindings_to_rows(bindings: Vec<Binding>) -> Vec<Row> {
    bindings.iter().map(binding_to_row).collect()
}
