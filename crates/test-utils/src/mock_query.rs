//! # SPARQL SELECT interpreter
//!
//! A hand-rolled evaluator scoped exactly to the grammar
//! `pod-query-translator::sparql` emits (§4.3): a BGP of required/`OPTIONAL`
//! triple patterns sharing `?subject`, one class constraint, an optional
//! `FILTER`, `DISTINCT`, `ORDER BY`, `LIMIT`, `OFFSET`. Nothing here
//! attempts to be a general SPARQL engine — `GROUP BY` and aggregate
//! projections never reach a [`SparqlEngine`](pod_query_executor::SparqlEngine)
//! in this system (the fallback planner computes those in-process, see
//! `pod-query-planner::group`), so this interpreter does not evaluate them.

use std::cmp::Ordering;
use std::collections::HashMap;

use pod_query_executor::{decode_binding_value, Binding, BindingValue};
use pod_query_ir::Value;

use crate::store::{brace_body, find_unescaped_quote, strip_prefixes, tokenize, unescape, Object, Triple};

struct Pattern {
    predicate: String,
    var: String,
    required: bool,
}

struct ParsedQuery<'a> {
    distinct: bool,
    fields: Vec<(String, String)>, // (source var, output alias)
    class: Option<String>,
    patterns: Vec<Pattern>,
    filter: Option<&'a str>,
    order_by: Vec<(String, bool)>, // (column, descending)
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Evaluate a SPARQL SELECT statement (as rendered by
/// `pod_query_translator::Translator`) against `triples`, the full set of
/// triples currently stored at the target resource.
pub fn execute_select(sparql: &str, triples: &[Triple]) -> Vec<Binding> {
    let text = strip_prefixes(sparql);
    let Some(where_idx) = text.find("WHERE {") else {
        return Vec::new();
    };
    let header = text[..where_idx].trim();
    let body_start = where_idx + "WHERE {".len();
    let Some(end) = text.rfind('}') else {
        return Vec::new();
    };
    let where_body = &text[body_start..end];
    let tail = &text[end + 1..];

    let parsed = ParsedQuery {
        distinct: parse_header(header).0,
        fields: parse_header(header).1,
        class: None,
        patterns: Vec::new(),
        filter: None,
        order_by: parse_order_by(tail),
        limit: parse_tail_int(tail, "LIMIT "),
        offset: parse_tail_int(tail, "OFFSET "),
    };
    let (class, patterns, filter) = parse_body(where_body);
    let parsed = ParsedQuery {
        class,
        patterns,
        filter,
        ..parsed
    };

    let subjects: std::collections::BTreeSet<&str> =
        triples.iter().map(|t| t.subject.as_str()).collect();

    let mut candidates: Vec<HashMap<String, BindingValue>> = Vec::new();
    for subject in subjects {
        if let Some(class) = &parsed.class {
            let has_class = triples
                .iter()
                .any(|t| t.subject == subject && t.predicate == "a" && t.object == Object::Iri(class.clone()));
            if !has_class {
                continue;
            }
        }

        let mut satisfied = true;
        let mut binding: HashMap<String, BindingValue> = HashMap::new();
        binding.insert("subject".to_string(), BindingValue::Iri(subject.to_string()));

        for pattern in &parsed.patterns {
            let found = triples
                .iter()
                .find(|t| t.subject == subject && t.predicate == pattern.predicate);
            match found {
                Some(t) => {
                    binding.insert(pattern.var.clone(), t.object.clone().into_binding());
                }
                None if pattern.required => {
                    satisfied = false;
                    break;
                }
                None => {}
            }
        }
        if !satisfied {
            continue;
        }
        candidates.push(binding);
    }

    if let Some(filter) = parsed.filter {
        candidates.retain(|b| eval_expr(filter, b));
    }

    if !parsed.order_by.is_empty() {
        candidates.sort_by(|a, b| {
            for (column, descending) in &parsed.order_by {
                let ordering = compare_bindings(a.get(column), b.get(column));
                let ordering = if *descending { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    let mut projected: Vec<Binding> = candidates
        .into_iter()
        .map(|raw| {
            let mut out = Binding::new();
            for (var, alias) in &parsed.fields {
                if let Some(value) = raw.get(var) {
                    out.insert(alias.clone(), value.clone());
                }
            }
            out
        })
        .collect();

    if parsed.distinct {
        let mut seen = std::collections::HashSet::new();
        projected.retain(|b| {
            let mut pairs: Vec<(String, String)> =
                b.iter().map(|(k, v)| (k.clone(), format!("{:?}", v))).collect();
            pairs.sort();
            seen.insert(format!("{:?}", pairs))
        });
    }

    if let Some(offset) = parsed.offset {
        if offset > 0 {
            projected = projected.into_iter().skip(offset as usize).collect();
        }
    }
    if let Some(limit) = parsed.limit {
        if limit >= 0 {
            projected = projected.into_iter().take(limit as usize).collect();
        }
    }

    projected
}

fn compare_bindings(a: Option<&BindingValue>, b: Option<&BindingValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let a = decode_binding_value(a);
            let b = decode_binding_value(b);
            match (&a, &b) {
                (Value::Null, Value::Null) => Ordering::Equal,
                (Value::Null, _) => Ordering::Greater,
                (_, Value::Null) => Ordering::Less,
                (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
                (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                (Value::Integer(x), Value::Float(y)) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
                (Value::Float(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
                (Value::String(x), Value::String(y)) => x.cmp(y),
                (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
                (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
                _ => Ordering::Equal,
            }
        }
    }
}

/// Parse the `SELECT [DISTINCT] <fields>` header into (distinct, fields).
fn parse_header(header: &str) -> (bool, Vec<(String, String)>) {
    let rest = header.trim_start_matches("SELECT").trim_start();
    let (distinct, rest) = match rest.strip_prefix("DISTINCT") {
        Some(r) => (true, r.trim_start()),
        None => (false, rest),
    };
    let fields = tokenize_fields(rest)
        .into_iter()
        .map(|tok| parse_field(&tok))
        .collect();
    (distinct, fields)
}

/// Split a select-clause body into field tokens, keeping a parenthesized
/// `(?col AS ?alias)` group intact.
fn tokenize_fields(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '(' {
            let mut depth = 0i32;
            let mut tok = String::new();
            for c2 in chars.by_ref() {
                tok.push(c2);
                if c2 == '(' {
                    depth += 1;
                } else if c2 == ')' {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
            }
            tokens.push(tok);
            continue;
        }
        let mut tok = String::new();
        while let Some(&c2) = chars.peek() {
            if c2.is_whitespace() {
                break;
            }
            tok.push(c2);
            chars.next();
        }
        tokens.push(tok);
    }
    tokens
}

fn parse_field(tok: &str) -> (String, String) {
    if let Some(inner) = tok.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        if let Some((var, alias)) = inner.split_once(" AS ") {
            return (
                var.trim().trim_start_matches('?').to_string(),
                alias.trim().trim_start_matches('?').to_string(),
            );
        }
    }
    let name = tok.trim_start_matches('?').to_string();
    (name.clone(), name)
}

fn parse_body(body: &str) -> (Option<String>, Vec<Pattern>, Option<&str>) {
    let mut class = None;
    let mut patterns = Vec::new();
    let mut filter = None;
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("FILTER (") {
            // The line is exactly `FILTER (<expr>)`; its last char is the
            // outer paren's match.
            filter = rest.strip_suffix(')');
            continue;
        }
        if line.starts_with("OPTIONAL") {
            let inner = brace_body(line);
            if let Some(pattern) = parse_pattern_line(inner) {
                patterns.push(Pattern { required: false, ..pattern });
            }
            continue;
        }
        let tokens = tokenize(line);
        if tokens.len() >= 3 && tokens[1] == "a" {
            if let Some(iri) = tokens[2].strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                class = Some(iri.to_string());
            }
            continue;
        }
        if let Some(pattern) = parse_pattern_line(line) {
            patterns.push(pattern);
        }
    }
    (class, patterns, filter)
}

fn parse_pattern_line(line: &str) -> Option<Pattern> {
    let tokens = tokenize(line);
    let predicate = tokens.get(1)?.strip_prefix('<')?.strip_suffix('>')?.to_string();
    let var = tokens.get(2)?.strip_prefix('?')?.to_string();
    Some(Pattern { predicate, var, required: true })
}

fn parse_order_by(tail: &str) -> Vec<(String, bool)> {
    for line in tail.lines() {
        if let Some(rest) = line.trim().strip_prefix("ORDER BY ") {
            return tokenize_fields(rest)
                .into_iter()
                .map(|tok| {
                    if let Some(inner) = tok.strip_prefix("DESC(").and_then(|r| r.strip_suffix(')')) {
                        (inner.trim_start_matches('?').to_string(), true)
                    } else {
                        (tok.trim_start_matches('?').to_string(), false)
                    }
                })
                .collect();
        }
    }
    Vec::new()
}

fn parse_tail_int(tail: &str, prefix: &str) -> Option<i64> {
    for line in tail.lines() {
        if let Some(rest) = line.trim().strip_prefix(prefix) {
            return rest.trim().parse().ok();
        }
    }
    None
}

// --- FILTER expression evaluation -----------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum FilterLiteral {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Iri(String),
    List(Vec<FilterLiteral>),
}

enum Operand {
    Var(String),
    StrVar(String),
    Literal(FilterLiteral),
}

fn value_as_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::DateTime(dt) => dt.to_rfc3339(),
        Value::Json(j) => j.to_string(),
    }
}

fn value_to_filter_literal(v: &Value) -> FilterLiteral {
    match v {
        Value::Null => FilterLiteral::Null,
        Value::String(s) => FilterLiteral::Str(s.clone()),
        Value::Integer(i) => FilterLiteral::Int(*i),
        Value::Float(f) => FilterLiteral::Float(*f),
        Value::Boolean(b) => FilterLiteral::Bool(*b),
        Value::DateTime(dt) => FilterLiteral::Str(dt.to_rfc3339()),
        Value::Json(j) => FilterLiteral::Str(j.to_string()),
    }
}

fn as_text_literal(l: &FilterLiteral) -> Option<&str> {
    match l {
        FilterLiteral::Str(s) | FilterLiteral::Iri(s) => Some(s),
        _ => None,
    }
}

fn literals_equal(a: &FilterLiteral, b: &FilterLiteral) -> bool {
    if let (Some(sa), Some(sb)) = (as_text_literal(a), as_text_literal(b)) {
        return sa == sb;
    }
    compare_ordered(a, b) == Some(Ordering::Equal)
}

fn compare_ordered(a: &FilterLiteral, b: &FilterLiteral) -> Option<Ordering> {
    if let (Some(sa), Some(sb)) = (as_text_literal(a), as_text_literal(b)) {
        return sa.partial_cmp(sb);
    }
    use FilterLiteral::*;
    match (a, b) {
        (Int(x), Int(y)) => x.partial_cmp(y),
        (Float(x), Float(y)) => x.partial_cmp(y),
        (Int(x), Float(y)) => (*x as f64).partial_cmp(y),
        (Float(x), Int(y)) => x.partial_cmp(&(*y as f64)),
        (Bool(x), Bool(y)) => x.partial_cmp(y),
        _ => None,
    }
}

fn parse_literal(text: &str) -> FilterLiteral {
    let text = text.trim();
    if text == "UNDEF" {
        return FilterLiteral::Null;
    }
    if let Some(inner) = text.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        return FilterLiteral::Iri(inner.to_string());
    }
    if let Some(rest) = text.strip_prefix('"') {
        let close = find_unescaped_quote(rest).unwrap_or(rest.len());
        return FilterLiteral::Str(unescape(&rest[..close]));
    }
    if text == "true" {
        return FilterLiteral::Bool(true);
    }
    if text == "false" {
        return FilterLiteral::Bool(false);
    }
    if let Some(inner) = text.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        let items = split_top_level(inner, ", ").unwrap_or_else(|| vec![inner]);
        return FilterLiteral::List(items.into_iter().map(|i| parse_literal(i.trim())).collect());
    }
    if let Ok(i) = text.parse::<i64>() {
        return FilterLiteral::Int(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return FilterLiteral::Float(f);
    }
    FilterLiteral::Str(text.to_string())
}

fn parse_operand(s: &str) -> Operand {
    let s = s.trim();
    if let Some(inner) = s.strip_prefix("str(").and_then(|r| r.strip_suffix(')')) {
        return Operand::StrVar(inner.trim().trim_start_matches('?').to_string());
    }
    if let Some(var) = s.strip_prefix('?') {
        return Operand::Var(var.to_string());
    }
    Operand::Literal(parse_literal(s))
}

fn get_operand_value(op: &Operand, binding: &HashMap<String, BindingValue>) -> Option<FilterLiteral> {
    match op {
        Operand::Var(name) => binding.get(name).map(|bv| value_to_filter_literal(&decode_binding_value(bv))),
        Operand::StrVar(name) => binding
            .get(name)
            .map(|bv| FilterLiteral::Str(value_as_text(&decode_binding_value(bv)))),
        Operand::Literal(lit) => Some(lit.clone()),
    }
}

/// Find the first occurrence of `token` outside quoted strings and at
/// bracket depth zero.
fn find_top_level_token(s: &str, token: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let tbytes = token.as_bytes();
    let mut in_quotes = false;
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_quotes = !in_quotes;
            i += 1;
            continue;
        }
        if !in_quotes {
            match c {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            if depth == 0 && i + tbytes.len() <= bytes.len() && &bytes[i..i + tbytes.len()] == tbytes {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

fn split_top_level<'a>(s: &'a str, sep: &str) -> Option<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut rest = s;
    let mut found_any = false;
    loop {
        match find_top_level_token(rest, sep) {
            Some(idx) => {
                found_any = true;
                parts.push(&rest[..idx]);
                rest = &rest[idx + sep.len()..];
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    if found_any {
        Some(parts)
    } else {
        None
    }
}

fn strip_outer_parens(s: &str) -> &str {
    let mut s = s.trim();
    loop {
        if !s.starts_with('(') || !s.ends_with(')') {
            return s;
        }
        let bytes = s.as_bytes();
        let mut depth = 0i32;
        let mut matches_at_end = false;
        for (i, &b) in bytes.iter().enumerate() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        matches_at_end = i == bytes.len() - 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        if matches_at_end {
            s = s[1..s.len() - 1].trim();
        } else {
            return s;
        }
    }
}

const COMPARISON_OPS: [&str; 8] = [" != ", " <= ", " >= ", " notin ", " = ", " < ", " > ", " in "];

fn find_operator(s: &str) -> Option<(usize, &'static str)> {
    let mut best: Option<(usize, &'static str)> = None;
    for op in COMPARISON_OPS {
        if let Some(idx) = find_top_level_token(s, op) {
            if best.map(|(bi, _)| idx < bi).unwrap_or(true) {
                best = Some((idx, op));
            }
        }
    }
    best
}

fn eval_comparison(lhs_text: &str, op: &str, rhs_text: &str, binding: &HashMap<String, BindingValue>) -> bool {
    let lhs = parse_operand(lhs_text);
    let Some(lval) = get_operand_value(&lhs, binding) else {
        return false;
    };
    let rhs = parse_literal(rhs_text.trim());
    match op.trim() {
        "=" => literals_equal(&lval, &rhs),
        "!=" => !literals_equal(&lval, &rhs),
        "<" => compare_ordered(&lval, &rhs) == Some(Ordering::Less),
        "<=" => matches!(compare_ordered(&lval, &rhs), Some(Ordering::Less) | Some(Ordering::Equal)),
        ">" => compare_ordered(&lval, &rhs) == Some(Ordering::Greater),
        ">=" => matches!(compare_ordered(&lval, &rhs), Some(Ordering::Greater) | Some(Ordering::Equal)),
        "in" => match &rhs {
            FilterLiteral::List(items) => items.iter().any(|it| literals_equal(&lval, it)),
            other => literals_equal(&lval, other),
        },
        "notin" => match &rhs {
            FilterLiteral::List(items) => !items.iter().any(|it| literals_equal(&lval, it)),
            other => !literals_equal(&lval, other),
        },
        _ => false,
    }
}

fn eval_regex(expr: &str, binding: &HashMap<String, BindingValue>) -> bool {
    let Some(rest) = expr.strip_prefix("regex(str(") else { return false };
    let Some(close_var) = rest.find(')') else { return false };
    let var = rest[..close_var].trim_start_matches('?');
    let after = rest[close_var + 1..].trim_start();
    let Some(after) = after.strip_prefix(',') else { return false };
    let after = after.trim_start();
    let Some(after) = after.strip_prefix('"') else { return false };
    let Some(end_pat) = find_unescaped_quote(after) else { return false };
    let pattern = unescape(&after[..end_pat]);
    let after2 = after[end_pat + 1..].trim_start();
    let Some(after2) = after2.strip_prefix(',') else { return false };
    let after2 = after2.trim_start();
    let Some(after2) = after2.strip_prefix('"') else { return false };
    let Some(end_flags) = find_unescaped_quote(after2) else { return false };
    let flags = &after2[..end_flags];

    let Some(bv) = binding.get(var) else { return false };
    let text = value_as_text(&decode_binding_value(bv));
    let case_insensitive = flags.contains('i');
    match regex::RegexBuilder::new(&pattern).case_insensitive(case_insensitive).build() {
        Ok(re) => re.is_match(&text),
        Err(_) => false,
    }
}

fn eval_expr(s: &str, binding: &HashMap<String, BindingValue>) -> bool {
    let s = strip_outer_parens(s);
    if let Some(parts) = split_top_level(s, " && ") {
        return parts.iter().all(|p| eval_expr(p, binding));
    }
    if let Some(parts) = split_top_level(s, " || ") {
        return parts.iter().any(|p| eval_expr(p, binding));
    }
    if let Some(rest) = s.strip_prefix('!') {
        return !eval_expr(rest, binding);
    }
    if let Some(inner) = s.strip_prefix("bound(").and_then(|r| r.strip_suffix(')')) {
        let var = inner.trim().trim_start_matches('?');
        return binding.contains_key(var);
    }
    if s.starts_with("regex(") {
        return eval_regex(s, binding);
    }
    if let Some((idx, op)) = find_operator(s) {
        return eval_comparison(&s[..idx], op, &s[idx + op.len()..], binding);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(subject: &str, predicate: &str, object: Object) -> Triple {
        Triple { subject: subject.into(), predicate: predicate.into(), object }
    }

    fn sample_triples() -> Vec<Triple> {
        vec![
            triple("s/p1", "a", Object::Iri("http://schema.org/Person".into())),
            triple(
                "s/p1",
                "http://xmlns.com/foaf/0.1/name",
                Object::Literal { value: "Alice".into(), datatype: None },
            ),
            triple(
                "s/p1",
                "http://example.org/age",
                Object::Literal {
                    value: "30".into(),
                    datatype: Some("http://www.w3.org/2001/XMLSchema#integer".into()),
                },
            ),
            triple("s/p2", "a", Object::Iri("http://schema.org/Person".into())),
            triple(
                "s/p2",
                "http://xmlns.com/foaf/0.1/name",
                Object::Literal { value: "Bob".into(), datatype: None },
            ),
        ]
    }

    fn select_sparql() -> &'static str {
        "PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>\nSELECT ?subject ?name ?age WHERE {\n  ?subject <http://xmlns.com/foaf/0.1/name> ?name .\n  OPTIONAL { ?subject <http://example.org/age> ?age . }\n  ?subject a <http://schema.org/Person> .\n}"
    }

    #[test]
    fn required_and_optional_patterns_bind_both_subjects() {
        let bindings = execute_select(select_sparql(), &sample_triples());
        assert_eq!(bindings.len(), 2);
        let alice = bindings.iter().find(|b| b.get("name").unwrap().as_str() == "Alice").unwrap();
        assert_eq!(alice.get("age").unwrap().as_str(), "30");
        let bob = bindings.iter().find(|b| b.get("name").unwrap().as_str() == "Bob").unwrap();
        assert!(bob.get("age").is_none());
    }

    #[test]
    fn filter_eq_narrows_to_one_subject() {
        let sparql = format!(
            "{}\n  FILTER (?name = \"Alice\")\n}}",
            select_sparql().trim_end_matches('}')
        );
        let bindings = execute_select(&sparql, &sample_triples());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("name").unwrap().as_str(), "Alice");
    }

    #[test]
    fn filter_like_matches_case_insensitively() {
        let sparql = format!(
            "{}\n  FILTER (regex(str(?name), \"^a.*$\", \"i\"))\n}}",
            select_sparql().trim_end_matches('}')
        );
        let bindings = execute_select(&sparql, &sample_triples());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("name").unwrap().as_str(), "Alice");
    }

    #[test]
    fn order_by_desc_then_limit_picks_the_oldest() {
        let sparql = format!(
            "{}\nORDER BY DESC(?age)\nLIMIT 1",
            select_sparql()
        );
        let bindings = execute_select(&sparql, &sample_triples());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("name").unwrap().as_str(), "Alice");
    }

    #[test]
    fn is_null_filter_keeps_only_unbound_optional() {
        let sparql = format!(
            "{}\n  FILTER (!bound(?age))\n}}",
            select_sparql().trim_end_matches('}')
        );
        let bindings = execute_select(&sparql, &sample_triples());
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].get("name").unwrap().as_str(), "Bob");
    }
}
