//! Fluent select builder (§4.2).

use std::collections::HashMap;

use pod_query_executor::PodDialect;
use pod_query_ir::{
    Column, ColumnRef, Condition, IrError, JoinDescriptor, JoinType, OperationKind, Operation,
    OrderBy, Row, SelectField, Table,
};

use crate::error::{BuilderError, BuilderResult};
use crate::split::split;

/// Callers write join conditions against a table's bare name (e.g.
/// `users.id`); when that name got suffixed to a fresh alias (a self-join
/// or a repeated table), rewrite references to the old name so
/// `JoinDescriptor::new`'s alias check lines up with the assigned alias.
fn rename_alias(column: ColumnRef, from: &str, to: &str) -> ColumnRef {
    if column.alias.as_deref() == Some(from) {
        ColumnRef::qualified(to, column.column)
    } else {
        column
    }
}

pub struct SelectBuilder<'a> {
    dialect: &'a PodDialect,
    tables: HashMap<String, Table>,
    op: Operation,
    fields_given: bool,
}

impl<'a> SelectBuilder<'a> {
    pub fn new(dialect: &'a PodDialect, table: Table) -> Self {
        let alias = table.name.clone();
        let mut tables = HashMap::new();
        tables.insert(alias.clone(), table);
        Self {
            dialect,
            tables,
            op: Operation::select(alias),
            fields_given: false,
        }
    }

    /// Set the select list. Absent (never called) means "all columns
    /// except `id`", resolved lazily in [`Self::execute`] once the
    /// primary table is known.
    pub fn select<S>(mut self, fields: impl IntoIterator<Item = (S, SelectField)>) -> Self
    where
        S: Into<String>,
    {
        if let OperationKind::Select { fields: f, .. } = &mut self.op.kind {
            *f = fields.into_iter().map(|(a, field)| (a.into(), field)).collect();
            self.fields_given = true;
        }
        self
    }

    pub fn where_(mut self, condition: Condition) -> Self {
        let (primary, mut join_filters) = split(condition, &self.op.alias);
        self.op.where_ = match (self.op.where_.take(), primary) {
            (Some(existing), Some(new)) => Some(pod_query_ir::and(vec![existing, new])),
            (Some(existing), None) => Some(existing),
            (None, Some(new)) => Some(new),
            (None, None) => None,
        };
        self.op.join_filters.append(&mut join_filters);
        self
    }

    /// Assign `table`'s alias: its bare name, unless that name is already
    /// registered (the base table, or an earlier join of the same table),
    /// in which case suffix it (`users` -> `users_2`, `users_3`, ...) per
    /// §4.2 "further tables with the same name get suffixed aliases."
    fn unique_alias(&self, name: &str) -> String {
        if !self.tables.contains_key(name) {
            return name.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", name, n);
            if !self.tables.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn join(mut self, table: Table, join_type: JoinType, conditions: Vec<(ColumnRef, ColumnRef)>) -> BuilderResult<Self> {
        let name = table.name.clone();
        let alias = self.unique_alias(&name);
        let conditions = if alias == name {
            conditions
        } else {
            conditions
                .into_iter()
                .map(|(l, r)| (rename_alias(l, &name, &alias), rename_alias(r, &name, &alias)))
                .collect()
        };
        let descriptor = JoinDescriptor::new(name, alias.clone(), join_type, conditions)?;
        self.tables.insert(alias, table);
        self.op.joins.push(descriptor);
        Ok(self)
    }

    pub fn inner_join(self, table: Table, conditions: Vec<(ColumnRef, ColumnRef)>) -> BuilderResult<Self> {
        self.join(table, JoinType::Inner, conditions)
    }

    pub fn left_join(self, table: Table, conditions: Vec<(ColumnRef, ColumnRef)>) -> BuilderResult<Self> {
        self.join(table, JoinType::Left, conditions)
    }

    pub fn group_by(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        if let OperationKind::Select { group_by, .. } = &mut self.op.kind {
            group_by.extend(columns);
        }
        self
    }

    pub fn order_by(mut self, column: impl Into<ColumnRef>, descending: bool) -> Self {
        if let OperationKind::Select { order_by, .. } = &mut self.op.kind {
            order_by.push(if descending { OrderBy::desc(column) } else { OrderBy::asc(column) });
        }
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        if let OperationKind::Select { limit, .. } = &mut self.op.kind {
            *limit = Some(n);
        }
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        if let OperationKind::Select { offset, .. } = &mut self.op.kind {
            *offset = Some(n);
        }
        self
    }

    pub fn distinct(mut self, enable: bool) -> Self {
        if let OperationKind::Select { distinct, .. } = &mut self.op.kind {
            *distinct = enable;
        }
        self
    }

    fn default_fields(table: &Table) -> Vec<(String, SelectField)> {
        table
            .columns()
            .filter(|c| c.name != "id")
            .map(|c: &Column| (c.name.clone(), SelectField::Column(ColumnRef::new(c.name.clone()))))
            .collect()
    }

    pub async fn execute(mut self) -> BuilderResult<Vec<Row>> {
        if let OperationKind::Select { limit, offset, .. } = &self.op.kind {
            if let Some(n) = limit {
                if *n < 0 {
                    return Err(BuilderError::Ir(IrError::NegativeLimit(*n)));
                }
            }
            if let Some(n) = offset {
                if *n < 0 {
                    return Err(BuilderError::Ir(IrError::NegativeOffset(*n)));
                }
            }
        }

        if !self.fields_given {
            let primary = &self.tables[&self.op.alias];
            let defaults = Self::default_fields(primary);
            if let OperationKind::Select { fields, .. } = &mut self.op.kind {
                *fields = defaults;
            }
        }

        if let OperationKind::Select { fields, group_by, .. } = &self.op.kind {
            let has_aggregate = fields.iter().any(|(_, f)| matches!(f, SelectField::Aggregate(_)));
            if has_aggregate {
                for (_, field) in fields {
                    if let SelectField::Column(column) = field {
                        if !group_by.iter().any(|g| g.column == column.column) {
                            return Err(BuilderError::Ir(IrError::MixedSelectWithoutGroupBy(
                                column.qualified_name(),
                            )));
                        }
                    }
                }
            }
        }

        let primary_table = &self.tables[&self.op.alias];
        if self.op.is_native_select() {
            Ok(self.dialect.select_native(&self.op, primary_table).await?)
        } else {
            Ok(pod_query_planner::execute_select(self.dialect, &self.op, &self.tables).await?)
        }
    }
}
