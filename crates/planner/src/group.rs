//! # Group-by and aggregation (C7, §4.5 "Group-by + aggregation")
//!
//! Runs whenever a select has a non-empty `groupBy` or a select list made
//! entirely of aggregates. Partitions rows by a stable JSON key over the
//! group-by columns (or treats every row as one group for a pure aggregate
//! with no `groupBy`), then reduces each partition per aggregate function
//! and projects non-aggregate columns from the group's first row.

use pod_query_ir::{Aggregate, AggregateFunc, ColumnRef, Row, SelectField, Value};

use crate::error::{PlannerError, PlannerResult};
use crate::post_filter::lookup;

/// A select list is pure-aggregate when every field is an [`Aggregate`]
/// and there is at least one field.
pub fn is_pure_aggregate(fields: &[(String, SelectField)]) -> bool {
    !fields.is_empty() && fields.iter().all(|(_, f)| matches!(f, SelectField::Aggregate(_)))
}

pub fn requires_grouping(fields: &[(String, SelectField)], group_by: &[ColumnRef]) -> bool {
    !group_by.is_empty() || is_pure_aggregate(fields)
}

/// Validate that every non-aggregate output column is one of the
/// `groupBy` columns (§4.2 "Select-list validation", §4.5 step 1).
pub fn validate(fields: &[(String, SelectField)], group_by: &[ColumnRef]) -> PlannerResult<()> {
    for (_, field) in fields {
        if let SelectField::Column(column) = field {
            let in_group_by = group_by
                .iter()
                .any(|g| g.column == column.column && g.alias == column.alias);
            if !in_group_by {
                return Err(PlannerError::MixedSelectWithoutGroupBy(column.qualified_name()));
            }
        }
    }
    Ok(())
}

fn group_key(row: &Row, group_by: &[ColumnRef]) -> String {
    let values: Vec<serde_json::Value> = group_by
        .iter()
        .map(|col| lookup(row, col).cloned().unwrap_or(Value::Null))
        .map(|v| serde_json::to_value(&v).unwrap_or(serde_json::Value::Null))
        .collect();
    serde_json::to_string(&values).unwrap_or_default()
}

/// Partition, reduce, and project. Returns one output row per group,
/// keyed by the select list's output aliases.
pub fn execute(
    rows: Vec<Row>,
    fields: &[(String, SelectField)],
    group_by: &[ColumnRef],
) -> PlannerResult<Vec<Row>> {
    validate(fields, group_by)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<Row>> = std::collections::HashMap::new();
    if group_by.is_empty() {
        order.push(String::new());
        groups.insert(String::new(), rows);
    } else {
        for row in rows {
            let key = group_key(&row, group_by);
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(row);
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        let members = &groups[&key];
        let mut projected = Row::new();
        for (alias, field) in fields {
            let value = match field {
                SelectField::Aggregate(agg) => reduce(agg, members)?,
                SelectField::Column(column) => members
                    .first()
                    .and_then(|r| lookup(r, column))
                    .cloned()
                    .unwrap_or(Value::Null),
            };
            projected.insert(alias.clone(), value);
        }
        out.push(projected);
    }
    Ok(out)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn reduce(agg: &Aggregate, rows: &[Row]) -> PlannerResult<Value> {
    match agg.func {
        AggregateFunc::Count => match &agg.column {
            None => Ok(Value::Integer(rows.len() as i64)),
            Some(column) => {
                let mut values: Vec<Value> = rows
                    .iter()
                    .filter_map(|r| lookup(r, column))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .collect();
                if agg.distinct {
                    dedup_by_json(&mut values);
                }
                Ok(Value::Integer(values.len() as i64))
            }
        },
        AggregateFunc::Sum | AggregateFunc::Avg | AggregateFunc::Min | AggregateFunc::Max => {
            let column = agg
                .column
                .as_ref()
                .ok_or(PlannerError::AggregateMissingColumn(agg.func))?;
            let mut values: Vec<&Value> = rows
                .iter()
                .filter_map(|r| lookup(r, column))
                .filter(|v| !v.is_null() && numeric(v).is_some())
                .collect();
            if agg.distinct {
                let mut seen = std::collections::HashSet::new();
                values.retain(|v| seen.insert(serde_json::to_string(v).unwrap_or_default()));
            }
            if values.is_empty() {
                return Ok(Value::Null);
            }
            // Stay in `Integer` when every contributing value is an integer
            // (matches the spec's untyped-number model: `sum`/`min`/`max`
            // over whole numbers should round-trip as whole numbers, not
            // always widen to float). `avg` divides, so it always floats.
            let all_integers = values.iter().all(|v| matches!(v, Value::Integer(_)));
            let numbers: Vec<f64> = values.into_iter().filter_map(numeric).collect();
            match agg.func {
                AggregateFunc::Sum if all_integers => {
                    Ok(Value::Integer(numbers.iter().sum::<f64>() as i64))
                }
                AggregateFunc::Sum => Ok(Value::Float(numbers.iter().sum())),
                AggregateFunc::Avg => Ok(Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)),
                AggregateFunc::Min if all_integers => {
                    Ok(Value::Integer(numbers.iter().cloned().fold(f64::INFINITY, f64::min) as i64))
                }
                AggregateFunc::Min => Ok(Value::Float(numbers.iter().cloned().fold(f64::INFINITY, f64::min))),
                AggregateFunc::Max if all_integers => {
                    Ok(Value::Integer(numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max) as i64))
                }
                AggregateFunc::Max => Ok(Value::Float(numbers.iter().cloned().fold(f64::NEG_INFINITY, f64::max))),
                AggregateFunc::Count => unreachable!(),
            }
        }
    }
}

fn dedup_by_json(values: &mut Vec<Value>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(serde_json::to_string(v).unwrap_or_default()));
}
