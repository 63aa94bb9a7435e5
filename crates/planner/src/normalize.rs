//! # Alias/projection resolution (C8, in-memory half)
//!
//! The part of result normalization that applies identically whether rows
//! came from a native SELECT or a fallback merge (§4.6): seeding a row's
//! alias-qualified keys so post-filters and joins can address
//! `alias.column`, and resolving a select projection's output aliases
//! against `alias.column` / plain-column / nothing, in that priority order.

use pod_query_ir::{Row, SelectField, Value};

/// Seed `row` with `alias.column` keys for every key it already has, so
/// later join/post-filter stages can address this row by its qualified
/// name regardless of whether it is the primary table or a joined one.
pub fn seed_row(row: &Row, alias: &str) -> Row {
    let mut seeded = row.clone();
    for (key, value) in row.iter() {
        seeded.insert(format!("{}.{}", alias, key), value.clone());
    }
    seeded
}

/// Resolve one row against a select projection, per §4.6's priority order:
/// exact alias match, then `alias.column`, then the plain column name, else
/// the cell is absent (treated as SQL `NULL`/JS `undefined`).
///
/// If `fields` is empty, the row passes through unchanged — there was no
/// projection to resolve against.
pub fn project_row(row: &Row, fields: &[(String, SelectField)]) -> Row {
    if fields.is_empty() {
        return row.clone();
    }
    let mut out = Row::new();
    for (output_alias, field) in fields {
        let column_name = match field {
            SelectField::Column(column) => &column.column,
            SelectField::Aggregate(_) => {
                // Aggregates are already projected to their output alias by
                // the group-by stage; nothing further to resolve here.
                if let Some(value) = row.get(output_alias) {
                    out.insert(output_alias.clone(), value.clone());
                }
                continue;
            }
        };
        let value = row
            .get(output_alias)
            .or_else(|| {
                field_qualified_key(field).and_then(|key| row.get(&key))
            })
            .or_else(|| row.get(column_name))
            .cloned()
            .unwrap_or(Value::Null);
        out.insert(output_alias.clone(), value);
    }
    out
}

fn field_qualified_key(field: &SelectField) -> Option<String> {
    match field {
        SelectField::Column(column) => column
            .alias
            .as_ref()
            .map(|alias| format!("{}.{}", alias, column.column)),
        SelectField::Aggregate(_) => None,
    }
}
