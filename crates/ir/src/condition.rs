//! # Condition algebra
//!
//! A boolean tree of comparisons, `IN`/`NOT IN`, `LIKE`, null tests, and
//! logical `AND`/`OR`/`NOT`. Both the SPARQL translator and the fallback
//! planner walk this tree; they share the operator codes defined here but
//! not their evaluation implementation.
//!
//! ## Column references
//!
//! A [`ColumnRef`] may carry a join alias (`"posts.authorId"`); conditions
//! whose alias is not the primary table's alias are split out by the query
//! builder into a post-merge filter list (see the `pod-query-builders` and
//! `pod-query-planner` crates).

use serde::{Deserialize, Serialize};

/// A column reference, optionally qualified by a join alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub alias: Option<String>,
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            alias: None,
            column: column.into(),
        }
    }

    pub fn qualified(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            column: column.into(),
        }
    }

    /// Parse a dotted `"alias.column"` string, or a bare column name.
    pub fn parse(s: &str) -> Self {
        match s.split_once('.') {
            Some((alias, column)) => Self::qualified(alias, column),
            None => Self::new(s),
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{}.{}", alias, self.column),
            None => self.column.clone(),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::parse(s)
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    In,
    NotIn,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    IsNull,
    IsNotNull,
    Not,
}

/// Logical combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// A literal value carried by a condition leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}
impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}
impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Integer(v)
    }
}
impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Float(v)
    }
}
impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Bool(v)
    }
}

/// A node in the condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Binary {
        column: ColumnRef,
        op: BinaryOp,
        value: Literal,
    },
    Unary {
        column: ColumnRef,
        op: UnaryOp,
    },
    /// `NOT <child>`, distinguished from the unary null-tests which take a
    /// column directly.
    Not(Box<Condition>),
    Logical {
        op: LogicalOp,
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Walk every [`ColumnRef`] mentioned anywhere in this tree.
    pub fn column_refs(&self) -> Vec<&ColumnRef> {
        let mut out = Vec::new();
        self.collect_column_refs(&mut out);
        out
    }

    fn collect_column_refs<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Condition::Binary { column, .. } | Condition::Unary { column, .. } => {
                out.push(column)
            }
            Condition::Not(inner) => inner.collect_column_refs(out),
            Condition::Logical { children, .. } => {
                for c in children {
                    c.collect_column_refs(out);
                }
            }
        }
    }
}

// Builder constructors, per §4.1.

pub fn eq(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Eq,
        value: value.into(),
    }
}

pub fn ne(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Ne,
        value: value.into(),
    }
}

pub fn lt(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Lt,
        value: value.into(),
    }
}

pub fn lte(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Lte,
        value: value.into(),
    }
}

pub fn gt(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Gt,
        value: value.into(),
    }
}

pub fn gte(column: impl Into<ColumnRef>, value: impl Into<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Gte,
        value: value.into(),
    }
}

pub fn like(column: impl Into<ColumnRef>, pattern: impl Into<String>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::Like,
        value: Literal::String(pattern.into()),
    }
}

pub fn in_array(column: impl Into<ColumnRef>, values: Vec<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::In,
        value: Literal::List(values),
    }
}

pub fn not_in_array(column: impl Into<ColumnRef>, values: Vec<Literal>) -> Condition {
    Condition::Binary {
        column: column.into(),
        op: BinaryOp::NotIn,
        value: Literal::List(values),
    }
}

pub fn is_null(column: impl Into<ColumnRef>) -> Condition {
    Condition::Unary {
        column: column.into(),
        op: UnaryOp::IsNull,
    }
}

pub fn is_not_null(column: impl Into<ColumnRef>) -> Condition {
    Condition::Unary {
        column: column.into(),
        op: UnaryOp::IsNotNull,
    }
}

pub fn and(children: Vec<Condition>) -> Condition {
    Condition::Logical {
        op: LogicalOp::And,
        children,
    }
}

pub fn or(children: Vec<Condition>) -> Condition {
    Condition::Logical {
        op: LogicalOp::Or,
        children,
    }
}

pub fn not(child: Condition) -> Condition {
    Condition::Not(Box::new(child))
}
