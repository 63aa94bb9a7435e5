//! Fluent update builder (§4.2, §4.4.3).

use pod_query_executor::{PodDialect, WriteOutcome};
use pod_query_ir::{Condition, Operation, RowValues, Table};

use crate::error::BuilderResult;

pub struct UpdateBuilder<'a> {
    dialect: &'a PodDialect,
    table: Table,
    set: RowValues,
    where_: Option<Condition>,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(dialect: &'a PodDialect, table: Table, set: RowValues) -> Self {
        Self { dialect, table, set, where_: None }
    }

    pub fn where_(mut self, condition: Condition) -> Self {
        self.where_ = Some(condition);
        self
    }

    pub async fn execute(self) -> BuilderResult<Vec<WriteOutcome>> {
        let where_ = self.where_.ok_or(pod_query_ir::IrError::UpdateWithoutWhere)?;
        let op = Operation::update(self.table.name.clone(), self.set, where_);
        Ok(self.dialect.update(&op, &self.table).await?)
    }
}
