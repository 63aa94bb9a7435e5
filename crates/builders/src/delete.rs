//! Fluent delete builder (§4.2, §4.4.4).

use pod_query_executor::{PodDialect, WriteOutcome};
use pod_query_ir::{Condition, Operation, Table};

use crate::error::BuilderResult;

pub struct DeleteBuilder<'a> {
    dialect: &'a PodDialect,
    table: Table,
    where_: Option<Condition>,
}

impl<'a> DeleteBuilder<'a> {
    pub fn new(dialect: &'a PodDialect, table: Table) -> Self {
        Self { dialect, table, where_: None }
    }

    pub fn where_(mut self, condition: Condition) -> Self {
        self.where_ = Some(condition);
        self
    }

    pub async fn execute(self) -> BuilderResult<Vec<WriteOutcome>> {
        let where_ = self.where_.ok_or(pod_query_ir::IrError::UpdateWithoutWhere)?;
        let op = Operation::delete(self.table.name.clone(), where_);
        Ok(self.dialect.delete(&op, &self.table).await?)
    }
}
