//! # In-memory Pod store
//!
//! The triple store [`MockSession`](crate::MockSession) and
//! [`MockSparqlEngine`](crate::MockSparqlEngine) share, plus the small
//! parser that turns the SPARQL update text the translator emits
//! (`INSERT DATA`/`DELETE WHERE`, per `pod-query-translator::sparql`) into
//! mutations against it. Resources are kept as structured triples rather
//! than round-tripped Turtle text — the mock never needs to re-parse its
//! own serialization, only the statements the dialect sends it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use pod_query_executor::BindingValue;

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// The object half of a stored triple. Subjects and predicates in this
/// store are always concrete IRIs; only the object can be a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Iri(String),
    Literal { value: String, datatype: Option<String> },
}

impl Object {
    pub fn into_binding(self) -> BindingValue {
        match self {
            Object::Iri(iri) => BindingValue::Iri(iri),
            Object::Literal { value, datatype } => BindingValue::Literal { value, datatype },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: Object,
}

/// A resource's content plus the one piece of container bookkeeping the
/// dialect's preflight checks need.
#[derive(Debug, Default)]
struct Resource {
    triples: Vec<Triple>,
}

/// The shared backing store for a `MockSession`/`MockSparqlEngine` pair.
/// `containers` and `resources` are deliberately one flat namespace per
/// kind, keyed by the full URL the dialect computes — this mock never
/// needs LDP containment semantics beyond "does this URL exist".
#[derive(Debug, Default)]
pub struct InMemoryPod {
    containers: HashSet<String>,
    resources: HashMap<String, Resource>,
}

pub type SharedPod = Arc<Mutex<InMemoryPod>>;

impl InMemoryPod {
    pub fn shared() -> SharedPod {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn container_exists(&self, url: &str) -> bool {
        self.containers.contains(url)
    }

    pub fn create_container(&mut self, url: &str) {
        self.containers.insert(url.to_string());
    }

    pub fn resource_exists(&self, url: &str) -> bool {
        self.resources.contains_key(url)
    }

    pub fn create_resource(&mut self, url: &str) {
        self.resources.entry(url.to_string()).or_default();
    }

    /// Triples currently stored at `url`, or an empty slice for an
    /// untouched/non-existent resource.
    pub fn triples(&self, url: &str) -> &[Triple] {
        self.resources.get(url).map(|r| r.triples.as_slice()).unwrap_or(&[])
    }

    /// A Turtle-flavored rendering of `url`'s triples. Only consumed by
    /// the executor's duplicate-subject scan (a substring `.contains`
    /// check on the raw body, §4.4.2), so exact literal formatting beyond
    /// "the subject IRI appears verbatim" does not matter.
    pub fn serialized_body(&self, url: &str) -> String {
        let mut out = String::new();
        for triple in self.triples(url) {
            let object = match &triple.object {
                Object::Iri(iri) => format!("<{}>", iri),
                Object::Literal { value, datatype: Some(dt) } => {
                    format!("\"{}\"^^<{}>", value.replace('"', "\\\""), dt)
                }
                Object::Literal { value, datatype: None } => format!("\"{}\"", value.replace('"', "\\\"")),
            };
            out.push_str(&format!("<{}> <{}> {} .\n", triple.subject, triple.predicate, object));
        }
        out
    }

    /// Apply a raw INSERT DATA statement (from the executor's POST on
    /// insert, §4.4.2): every triple the body names is appended.
    pub fn insert_data(&mut self, url: &str, sparql: &str) {
        let entry = self.resources.entry(url.to_string()).or_default();
        for triple in parse_triples(strip_prefixes(sparql)) {
            entry.triples.push(triple);
        }
    }

    /// Apply the `DELETE WHERE { ... } ; INSERT DATA { ... }`-style update
    /// text the translator renders for conditional update/delete (§4.3,
    /// §4.4.3–4.4.5). Segments are applied in order.
    pub fn apply_update(&mut self, url: &str, sparql: &str) {
        let body = strip_prefixes(sparql);
        for segment in split_statements(body) {
            let segment = segment.trim();
            if let Some(rest) = segment.strip_prefix("DELETE WHERE") {
                self.apply_delete(url, rest);
            } else if let Some(rest) = segment.strip_prefix("INSERT DATA") {
                let entry = self.resources.entry(url.to_string()).or_default();
                for triple in parse_triples(rest) {
                    entry.triples.push(triple);
                }
            }
        }
    }

    fn apply_delete(&mut self, url: &str, pattern_block: &str) {
        let inner = brace_body(pattern_block);
        let lines: Vec<&str> = inner.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let entry = self.resources.entry(url.to_string()).or_default();

        if lines.len() == 2 {
            if let Some(class) = lines[0].strip_prefix("?subject a <").and_then(|s| s.strip_suffix("> .")) {
                let class = class.to_string();
                let subjects: HashSet<String> = entry
                    .triples
                    .iter()
                    .filter(|t| t.predicate == "a" && t.object == Object::Iri(class.clone()))
                    .map(|t| t.subject.clone())
                    .collect();
                entry.triples.retain(|t| !subjects.contains(&t.subject));
                return;
            }
        }

        let Some(pattern) = lines.first() else { return };
        let Some((subject, predicate)) = parse_delete_pattern(pattern) else { return };
        match predicate {
            PatternPredicate::Wildcard => entry.triples.retain(|t| t.subject != subject),
            PatternPredicate::Concrete(pred) => {
                entry.triples.retain(|t| !(t.subject == subject && t.predicate == pred))
            }
        }
    }
}

enum PatternPredicate {
    Wildcard,
    Concrete(String),
}

/// Parse a `<subject> PRED ?var .` delete pattern line, where `PRED` is
/// either a variable (`?p`, matching any predicate) or a concrete `<iri>`.
fn parse_delete_pattern(line: &str) -> Option<(String, PatternPredicate)> {
    let tokens = tokenize(line);
    let subject = tokens.first()?.strip_prefix('<')?.strip_suffix('>')?.to_string();
    let predicate = tokens.get(1)?;
    let predicate = if let Some(stripped) = predicate.strip_prefix('?') {
        let _ = stripped;
        PatternPredicate::Wildcard
    } else {
        PatternPredicate::Concrete(predicate.strip_prefix('<')?.strip_suffix('>')?.to_string())
    };
    Some((subject, predicate))
}

/// Strip the leading `PREFIX px: <uri>` lines every rendered statement
/// opens with (`pod-query-translator::prefixes`); nothing else in the
/// grammar starts a line with `PREFIX`.
pub(crate) fn strip_prefixes(text: &str) -> &str {
    let mut rest = text;
    while let Some(idx) = rest.find('\n') {
        if rest[..idx].starts_with("PREFIX ") {
            rest = &rest[idx + 1..];
        } else {
            break;
        }
    }
    rest
}

/// Split on top-level `;\n` statement separators (`render_update_for_subject`
/// joins sibling statements this way; it never appears inside a triple
/// block, whose lines always end in ` .\n`).
fn split_statements(text: &str) -> Vec<&str> {
    text.split(";\n").collect()
}

/// The text between a block's outer `{` and matching `}`.
pub(crate) fn brace_body(text: &str) -> &str {
    let start = text.find('{').map(|i| i + 1).unwrap_or(0);
    let end = text.rfind('}').unwrap_or(text.len());
    if end > start {
        &text[start..end]
    } else {
        ""
    }
}

fn parse_triples(block: &str) -> Vec<Triple> {
    brace_body(block)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(parse_concrete_triple)
        .collect()
}

/// Parse one `<subject> PRED object .` line where every term is concrete
/// (no variables) — the shape every `INSERT DATA` triple line takes.
fn parse_concrete_triple(line: &str) -> Option<Triple> {
    let tokens = tokenize(line);
    let subject = tokens.first()?.strip_prefix('<')?.strip_suffix('>')?.to_string();
    let predicate_tok = tokens.get(1)?;
    let predicate = if predicate_tok == "a" {
        "a".to_string()
    } else {
        predicate_tok.strip_prefix('<')?.strip_suffix('>')?.to_string()
    };
    let object = parse_object(tokens.get(2)?)?;
    Some(Triple { subject, predicate, object })
}

pub(crate) fn parse_object(tok: &str) -> Option<Object> {
    if let Some(iri) = tok.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return Some(Object::Iri(iri.to_string()));
    }
    if let Some(rest) = tok.strip_prefix('"') {
        return Some(parse_quoted_literal(rest));
    }
    // Bare numeral: the translator emits integers/floats with no xsd
    // suffix, leaving datatype inference to the engine (§4.3).
    let datatype = if tok.contains('.') || tok.contains('e') || tok.contains('E') {
        format!("{}double", XSD)
    } else {
        format!("{}integer", XSD)
    };
    Some(Object::Literal { value: tok.to_string(), datatype: Some(datatype) })
}

/// `rest` is everything after the opening `"` of a quoted literal token
/// (as produced by [`tokenize`]), including its closing `"` and any
/// `^^xsd:Type` suffix.
fn parse_quoted_literal(rest: &str) -> Object {
    let close = find_unescaped_quote(rest).unwrap_or(rest.len());
    let raw = &rest[..close];
    let value = unescape(raw);
    let suffix = rest[close..].trim_start_matches('"');
    let datatype = suffix.strip_prefix("^^xsd:").map(|name| format!("{}{}", XSD, name));
    Object::Literal { value, datatype }
}

pub(crate) fn find_unescaped_quote(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

pub(crate) fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a single Turtle-ish line into its `<iri>`/`"literal"[^^xsd:Type]`/
/// bare/`?var`/`a` tokens, respecting quoted strings so embedded spaces
/// don't split a literal apart.
pub(crate) fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '.' {
            chars.next();
            continue;
        }
        if c == '<' {
            let mut tok = String::from("<");
            chars.next();
            for c2 in chars.by_ref() {
                tok.push(c2);
                if c2 == '>' {
                    break;
                }
            }
            tokens.push(tok);
            continue;
        }
        if c == '"' {
            let mut tok = String::from("\"");
            chars.next();
            let mut escaped = false;
            while let Some(&c2) = chars.peek() {
                tok.push(c2);
                chars.next();
                if escaped {
                    escaped = false;
                    continue;
                }
                if c2 == '\\' {
                    escaped = true;
                    continue;
                }
                if c2 == '"' {
                    break;
                }
            }
            // Possible immediately-following `^^xsd:Type` datatype suffix.
            if chars.peek() == Some(&'^') {
                while let Some(&c2) = chars.peek() {
                    if c2.is_whitespace() {
                        break;
                    }
                    tok.push(c2);
                    chars.next();
                }
            }
            tokens.push(tok);
            continue;
        }
        let mut tok = String::new();
        while let Some(&c2) = chars.peek() {
            if c2.is_whitespace() || c2 == '.' {
                break;
            }
            tok.push(c2);
            chars.next();
        }
        tokens.push(tok);
    }
    tokens
}
