//! # Post-merge modifiers (C7, §4.5 "Modifiers")
//!
//! `distinct`, then `orderBy`, then `offset`, then `limit`, applied in that
//! order to the already-projected row set. Order-by treats `Null` as
//! greater than any other value regardless of direction, so nulls always
//! sort last.

use std::cmp::Ordering;

use pod_query_ir::{OrderBy, Row, Value};

pub fn apply_distinct(rows: Vec<Row>, distinct: bool) -> Vec<Row> {
    if !distinct {
        return rows;
    }
    let mut seen = std::collections::HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(serde_json::to_string(row).unwrap_or_default()))
        .collect()
}

pub fn apply_order_by(mut rows: Vec<Row>, order_by: &[OrderBy]) -> Vec<Row> {
    if order_by.is_empty() {
        return rows;
    }
    rows.sort_by(|a, b| {
        for key in order_by {
            let ordering = compare_values(a.get(&key.column.column), b.get(&key.column.column), key.descending);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    rows
}

/// Nulls sort last regardless of `descending` — only the ordering among
/// non-null values gets reversed.
fn compare_values(a: Option<&Value>, b: Option<&Value>, descending: bool) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = match (a, b) {
                (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
                (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
                (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
                (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
                (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
                (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
                _ => Ordering::Equal,
            };
            if descending { ordering.reverse() } else { ordering }
        }
    }
}

pub fn apply_offset(rows: Vec<Row>, offset: Option<i64>) -> Vec<Row> {
    match offset {
        Some(n) if n > 0 => rows.into_iter().skip(n as usize).collect(),
        _ => rows,
    }
}

pub fn apply_limit(rows: Vec<Row>, limit: Option<i64>) -> Vec<Row> {
    match limit {
        Some(n) if n >= 0 => rows.into_iter().take(n as usize).collect(),
        _ => rows,
    }
}
