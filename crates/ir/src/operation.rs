//! # Operation IR
//!
//! The intermediate representation a query builder assembles and the
//! translator/executor consume: one [`Operation`] per select/insert/
//! update/delete, carrying its table, joins, projection, filters, and
//! modifiers.

use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::condition::{Condition, ColumnRef};
use crate::error::{IrError, IrResult};
use crate::row::Value;

/// A projected select field: a plain column, a dotted alias-qualified
/// column (`"posts.title"`), or an aggregate expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectField {
    Column(ColumnRef),
    Aggregate(Aggregate),
}

/// Join kind. Only inner and left joins are supported; building a
/// `rightJoin`/`fullJoin` is rejected at the builder layer with
/// [`IrError::UnsupportedJoinType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

/// One registered join: the joined table, its alias, the join kind, and
/// the equality conditions linking it to an already-registered alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinDescriptor {
    pub table: String,
    pub alias: String,
    pub join_type: JoinType,
    /// Equality pairs `(existing_alias.col, new_alias.col)`, in
    /// registration order. Only the first entry drives the fallback hash
    /// join (§4.5); the rest become post-filters.
    pub conditions: Vec<(ColumnRef, ColumnRef)>,
}

impl JoinDescriptor {
    pub fn new(
        table: impl Into<String>,
        alias: impl Into<String>,
        join_type: JoinType,
        conditions: Vec<(ColumnRef, ColumnRef)>,
    ) -> IrResult<Self> {
        if conditions.is_empty() {
            return Err(IrError::EmptyJoinCondition);
        }
        let alias = alias.into();
        for (left, right) in &conditions {
            let left_matches = left.alias.as_deref() == Some(alias.as_str());
            let right_matches = right.alias.as_deref() == Some(alias.as_str());
            if left_matches == right_matches {
                return Err(IrError::JoinConditionMissingAlias(
                    format!("{}={}", left.qualified_name(), right.qualified_name()),
                    alias,
                ));
            }
        }
        Ok(Self {
            table: table.into(),
            alias,
            join_type,
            conditions,
        })
    }

    /// The first join condition, oriented as `(base_side, joined_side)`.
    pub fn primary_condition(&self) -> (&ColumnRef, &ColumnRef) {
        let (left, right) = &self.conditions[0];
        if left.alias.as_deref() == Some(self.alias.as_str()) {
            (right, left)
        } else {
            (left, right)
        }
    }
}

/// An order-by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub descending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// One row's worth of values to write, keyed by column name.
pub type RowValues = std::collections::BTreeMap<String, Value>;

/// The kind-specific payload of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationKind {
    Select {
        fields: Vec<(String, SelectField)>,
        group_by: Vec<ColumnRef>,
        order_by: Vec<OrderBy>,
        limit: Option<i64>,
        offset: Option<i64>,
        distinct: bool,
    },
    Insert {
        rows: Vec<RowValues>,
    },
    Update {
        set: RowValues,
    },
    Delete,
}

/// A fully-assembled operation: table, alias, joins, filter tree, and a
/// kind-specific payload. Builders construct this progressively; the
/// executor and translator consume it read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub table: String,
    pub alias: String,
    pub joins: Vec<JoinDescriptor>,
    pub where_: Option<Condition>,
    /// Conditions whose column alias is not the primary table's alias;
    /// evaluated post-merge rather than pushed into the primary SELECT.
    pub join_filters: Vec<Condition>,
    pub kind: OperationKind,
}

impl Operation {
    pub fn select(table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            joins: Vec::new(),
            where_: None,
            join_filters: Vec::new(),
            kind: OperationKind::Select {
                fields: Vec::new(),
                group_by: Vec::new(),
                order_by: Vec::new(),
                limit: None,
                offset: None,
                distinct: false,
            },
        }
    }

    pub fn insert(table: impl Into<String>, rows: Vec<RowValues>) -> IrResult<Self> {
        let mut seen = std::collections::HashSet::new();
        for row in &rows {
            if let Some(Value::String(id)) = row.get("id") {
                if !seen.insert(id.clone()) {
                    return Err(IrError::DuplicateInsertId(id.clone()));
                }
            }
        }
        let table = table.into();
        Ok(Self {
            alias: table.clone(),
            table,
            joins: Vec::new(),
            where_: None,
            join_filters: Vec::new(),
            kind: OperationKind::Insert { rows },
        })
    }

    pub fn update(table: impl Into<String>, set: RowValues, where_: Condition) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            joins: Vec::new(),
            where_: Some(where_),
            join_filters: Vec::new(),
            kind: OperationKind::Update { set },
        }
    }

    pub fn delete(table: impl Into<String>, where_: Condition) -> Self {
        let table = table.into();
        Self {
            alias: table.clone(),
            table,
            joins: Vec::new(),
            where_: Some(where_),
            join_filters: Vec::new(),
            kind: OperationKind::Delete,
        }
    }

    /// Whether this select can be dispatched natively: no joins, no
    /// group-by, no aggregate select fields (§4.4.6).
    pub fn is_native_select(&self) -> bool {
        if !self.joins.is_empty() {
            return false;
        }
        match &self.kind {
            OperationKind::Select { fields, group_by, .. } => {
                group_by.is_empty()
                    && !fields
                        .iter()
                        .any(|(_, f)| matches!(f, SelectField::Aggregate(_)))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::eq;

    #[test]
    fn join_descriptor_rejects_empty_conditions() {
        let result = JoinDescriptor::new("posts", "posts", JoinType::Inner, vec![]);
        assert!(matches!(result, Err(IrError::EmptyJoinCondition)));
    }

    #[test]
    fn join_descriptor_requires_new_alias_on_exactly_one_side() {
        let result = JoinDescriptor::new(
            "posts",
            "posts",
            JoinType::Inner,
            vec![(ColumnRef::qualified("profiles", "id"), ColumnRef::qualified("profiles", "authorId"))],
        );
        assert!(matches!(result, Err(IrError::JoinConditionMissingAlias(_, _))));
    }

    #[test]
    fn join_descriptor_accepts_valid_condition() {
        let join = JoinDescriptor::new(
            "posts",
            "posts",
            JoinType::Inner,
            vec![(ColumnRef::qualified("profiles", "id"), ColumnRef::qualified("posts", "authorId"))],
        )
        .unwrap();
        let (base, joined) = join.primary_condition();
        assert_eq!(base.qualified_name(), "profiles.id");
        assert_eq!(joined.qualified_name(), "posts.authorId");
    }

    #[test]
    fn native_select_requires_no_joins_group_by_or_aggregates() {
        let mut op = Operation::select("profiles");
        assert!(op.is_native_select());
        if let OperationKind::Select { group_by, .. } = &mut op.kind {
            group_by.push(ColumnRef::new("age"));
        }
        assert!(!op.is_native_select());
    }

    #[test]
    fn insert_rejects_duplicate_ids_in_batch() {
        let mut row_a = RowValues::new();
        row_a.insert("id".into(), Value::String("1".into()));
        let mut row_b = RowValues::new();
        row_b.insert("id".into(), Value::String("1".into()));
        let result = Operation::insert("profiles", vec![row_a, row_b]);
        assert!(matches!(result, Err(IrError::DuplicateInsertId(_))));
    }

    #[test]
    fn update_carries_where_and_set() {
        let op = Operation::update("profiles", RowValues::new(), eq("id", "1"));
        assert!(op.where_.is_some());
    }
}
