//! # In-memory condition evaluation
//!
//! Evaluates a [`Condition`] tree against an already-merged, alias-seeded
//! [`Row`] (§4.5 "Post-filters"). Operator semantics mirror the SPARQL
//! translator's (`pod-query-translator::filter`) but the two never share
//! code: one produces text, this one produces a boolean.

use pod_query_ir::{BinaryOp, ColumnRef, Condition, Literal, LogicalOp, Row, UnaryOp, Value};

/// Translate a `LIKE` pattern into a regex body the same way the SPARQL
/// translator does (`%` → `.*`, `_` → any character, everything else
/// escaped), so fallback post-filters and the native path agree on what
/// `LIKE` means.
pub fn like_to_regex_body(pattern: &str) -> String {
    let mut out = String::new();
    for ch in pattern.chars() {
        match ch {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out
}

/// Look up a row cell by a (possibly alias-qualified) column reference.
/// Rows are seeded with both plain and `alias.column` keys (see
/// [`crate::normalize::seed_row`]), so an unqualified reference still
/// resolves against the primary row correctly.
pub(crate) fn lookup<'a>(row: &'a Row, column: &ColumnRef) -> Option<&'a Value> {
    match &column.alias {
        Some(alias) => row.get(&format!("{}.{}", alias, column.column)),
        None => row.get(&column.column),
    }
}

fn is_absent_or_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Keep only the rows for which every filter in `filters` evaluates true.
pub fn apply(rows: Vec<Row>, filters: &[Condition]) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| filters.iter().all(|f| evaluate(row, f)))
        .collect()
}

pub fn evaluate(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::Binary { column, op, value } => evaluate_binary(row, column, *op, value),
        Condition::Unary { column, op } => evaluate_unary(row, column, *op),
        Condition::Not(inner) => !evaluate(row, inner),
        Condition::Logical { op, children } => match op {
            LogicalOp::And => children.iter().all(|c| evaluate(row, c)),
            LogicalOp::Or => children.iter().any(|c| evaluate(row, c)),
        },
    }
}

fn evaluate_unary(row: &Row, column: &ColumnRef, op: UnaryOp) -> bool {
    let value = lookup(row, column);
    match op {
        UnaryOp::IsNull => is_absent_or_null(value),
        UnaryOp::IsNotNull => !is_absent_or_null(value),
        UnaryOp::Not => !matches!(value, Some(Value::Boolean(true))),
    }
}

fn evaluate_binary(row: &Row, column: &ColumnRef, op: BinaryOp, literal: &Literal) -> bool {
    let value = lookup(row, column);
    match op {
        BinaryOp::Eq => values_equal(value, literal),
        BinaryOp::Ne => !values_equal(value, literal),
        BinaryOp::Lt => compare(value, literal).map(|o| o.is_lt()).unwrap_or(false),
        BinaryOp::Lte => compare(value, literal).map(|o| o.is_le()).unwrap_or(false),
        BinaryOp::Gt => compare(value, literal).map(|o| o.is_gt()).unwrap_or(false),
        BinaryOp::Gte => compare(value, literal).map(|o| o.is_ge()).unwrap_or(false),
        BinaryOp::Like => match (value, literal) {
            (Some(Value::String(s)), Literal::String(pattern)) => {
                let body = like_to_regex_body(pattern);
                regex::RegexBuilder::new(&format!("^{}$", body))
                    .case_insensitive(true)
                    .build()
                    .map(|re| re.is_match(s))
                    .unwrap_or(false)
            }
            _ => false,
        },
        BinaryOp::In => membership(value, literal),
        BinaryOp::NotIn => !membership(value, literal),
    }
}

fn values_equal(value: Option<&Value>, literal: &Literal) -> bool {
    match (value, literal) {
        (Some(Value::String(s)), Literal::String(l)) => s == l,
        (Some(Value::Integer(i)), Literal::Integer(l)) => i == l,
        (Some(Value::Integer(i)), Literal::Float(l)) => (*i as f64) == *l,
        (Some(Value::Float(f)), Literal::Float(l)) => f == l,
        (Some(Value::Float(f)), Literal::Integer(l)) => *f == (*l as f64),
        (Some(Value::Boolean(b)), Literal::Bool(l)) => b == l,
        (None, Literal::Null) | (Some(Value::Null), Literal::Null) => true,
        _ => false,
    }
}

fn compare(value: Option<&Value>, literal: &Literal) -> Option<std::cmp::Ordering> {
    match (value, literal) {
        (Some(Value::Integer(i)), Literal::Integer(l)) => Some((*i).cmp(l)),
        (Some(Value::Integer(i)), Literal::Float(l)) => (*i as f64).partial_cmp(l),
        (Some(Value::Float(f)), Literal::Float(l)) => f.partial_cmp(l),
        (Some(Value::Float(f)), Literal::Integer(l)) => f.partial_cmp(&(*l as f64)),
        (Some(Value::String(s)), Literal::String(l)) => Some(s.as_str().cmp(l.as_str())),
        (Some(Value::DateTime(dt)), Literal::String(l)) => chrono::DateTime::parse_from_rfc3339(l)
            .ok()
            .map(|parsed| dt.cmp(&parsed.with_timezone(&chrono::Utc))),
        _ => None,
    }
}

fn membership(value: Option<&Value>, literal: &Literal) -> bool {
    let items = match literal {
        Literal::List(items) => items,
        other => std::slice::from_ref(other),
    };
    items.iter().any(|item| values_equal(value, item))
}
