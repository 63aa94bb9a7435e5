//! # Filter expression rendering
//!
//! Walks a [`Condition`] tree and renders it as a single SPARQL boolean
//! expression suitable for a `FILTER (...)` clause. Shares operator codes
//! with `pod-query-planner`'s in-memory evaluator (§9 "Condition tree") but
//! not the implementation: this module only ever produces text.

use pod_query_ir::{BinaryOp, Condition, LogicalOp, PodIdentity, Table, UnaryOp};

use crate::literal::format_filter_literal;

/// Translate a `LIKE` pattern into the body of a SPARQL `regex(...)` call:
/// `%` becomes `.*`, `_` becomes any single character, and every other
/// regex metacharacter is escaped so it matches literally.
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

/// Render `condition` as a SPARQL filter expression against `table`.
/// Conditions on the reserved `id` column are rewritten into subject-URI
/// comparisons, per §4.3.
pub fn render_condition(condition: &Condition, table: &Table, identity: &PodIdentity) -> String {
    match condition {
        Condition::Binary { column, op, value } => {
            if column.column == "id" {
                return render_id_binary(*op, value, table, identity);
            }
            let var = format!("?{}", column.column);
            match op {
                BinaryOp::Eq => format!("{} = {}", var, format_filter_literal(value)),
                BinaryOp::Ne => format!("{} != {}", var, format_filter_literal(value)),
                BinaryOp::Lt => format!("{} < {}", var, format_filter_literal(value)),
                BinaryOp::Lte => format!("{} <= {}", var, format_filter_literal(value)),
                BinaryOp::Gt => format!("{} > {}", var, format_filter_literal(value)),
                BinaryOp::Gte => format!("{} >= {}", var, format_filter_literal(value)),
                BinaryOp::Like => {
                    let pattern = match value {
                        pod_query_ir::Literal::String(s) => s.as_str(),
                        _ => "",
                    };
                    format!(
                        "regex(str({}), \"^{}$\", \"i\")",
                        var,
                        like_to_regex_body(pattern)
                    )
                }
                BinaryOp::In => format!("{} in {}", var, format_filter_literal(value)),
                BinaryOp::NotIn => format!("{} notin {}", var, format_filter_literal(value)),
            }
        }
        Condition::Unary { column, op } => {
            if column.column == "id" {
                return match op {
                    UnaryOp::IsNull => "(1 = 0)".to_string(),
                    UnaryOp::IsNotNull => "(1 = 1)".to_string(),
                    UnaryOp::Not => "!(1 = 1)".to_string(),
                };
            }
            let var = format!("?{}", column.column);
            match op {
                UnaryOp::IsNull => format!("!bound({})", var),
                UnaryOp::IsNotNull => format!("bound({})", var),
                UnaryOp::Not => format!("!({})", var),
            }
        }
        Condition::Not(inner) => format!("!({})", render_condition(inner, table, identity)),
        Condition::Logical { op, children } => {
            let joiner = match op {
                LogicalOp::And => " && ",
                LogicalOp::Or => " || ",
            };
            let parts: Vec<String> = children
                .iter()
                .map(|c| format!("({})", render_condition(c, table, identity)))
                .collect();
            parts.join(joiner)
        }
    }
}

fn render_id_binary(
    op: BinaryOp,
    value: &pod_query_ir::Literal,
    table: &Table,
    identity: &PodIdentity,
) -> String {
    let subject_of = |id: &str| pod_query_ir::subject_uri(identity, table, id);
    match op {
        BinaryOp::Eq => format!("?subject = <{}>", subject_of(&literal_id(value))),
        BinaryOp::Ne => format!("?subject != <{}>", subject_of(&literal_id(value))),
        BinaryOp::In => format!("?subject in {}", subject_uri_list(value, table, identity)),
        BinaryOp::NotIn => format!("?subject notin {}", subject_uri_list(value, table, identity)),
        // id is a string; relational comparisons and LIKE on it are unusual
        // but not forbidden by the spec, so fall back to a literal string
        // comparison on the subject's IRI text.
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let cmp = match op {
                BinaryOp::Lt => "<",
                BinaryOp::Lte => "<=",
                BinaryOp::Gt => ">",
                _ => ">=",
            };
            format!("str(?subject) {} \"{}\"", cmp, subject_of(&literal_id(value)))
        }
        BinaryOp::Like => format!(
            "regex(str(?subject), \"^{}$\", \"i\")",
            like_to_regex_body(&literal_id(value))
        ),
    }
}

fn literal_id(value: &pod_query_ir::Literal) -> String {
    match value {
        pod_query_ir::Literal::String(s) => s.clone(),
        pod_query_ir::Literal::Integer(i) => i.to_string(),
        other => format!("{:?}", other),
    }
}

fn subject_uri_list(value: &pod_query_ir::Literal, table: &Table, identity: &PodIdentity) -> String {
    let ids: Vec<String> = match value {
        pod_query_ir::Literal::List(items) => items.iter().map(literal_id).collect(),
        other => vec![literal_id(other)],
    };
    let uris: Vec<String> = ids
        .iter()
        .map(|id| format!("<{}>", pod_query_ir::subject_uri(identity, table, id)))
        .collect();
    format!("({})", uris.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_query_ir::{eq, like, Column, ColumnType};

    fn table() -> Table {
        Table::new(
            "profiles",
            "t/",
            "http://schema.org/Person",
            vec![Column::new("id", ColumnType::String).primary_key()],
        )
        .unwrap()
    }

    fn identity() -> PodIdentity {
        PodIdentity::from_web_id("https://pod.example/alice/profile/card#me").unwrap()
    }

    #[test]
    fn like_pattern_translates_wildcards() {
        assert_eq!(like_to_regex_body("search%"), "search.*");
        assert_eq!(like_to_regex_body("a_c"), "a.c");
    }

    #[test]
    fn like_escapes_regex_metacharacters() {
        assert_eq!(like_to_regex_body("a.b"), "a\\.b");
    }

    #[test]
    fn eq_on_id_rewrites_to_subject_comparison() {
        let cond = eq("id", "p1");
        let rendered = render_condition(&cond, &table(), &identity());
        assert!(rendered.starts_with("?subject = <"));
        assert!(rendered.ends_with("#p1>"));
    }

    #[test]
    fn eq_on_plain_column_uses_its_variable() {
        let cond = eq("age", 30i64);
        let rendered = render_condition(&cond, &table(), &identity());
        assert_eq!(rendered, "?age = 30");
    }

    #[test]
    fn like_renders_case_insensitive_regex() {
        let cond = like("name", "search%");
        let rendered = render_condition(&cond, &table(), &identity());
        assert_eq!(rendered, "regex(str(?name), \"^search.*$\", \"i\")");
    }
}
