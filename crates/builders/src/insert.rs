//! Fluent insert builder (§4.2, §4.4.2).

use pod_query_executor::{PodDialect, WriteOutcome};
use pod_query_ir::{Operation, RowValues, Table};

use crate::error::BuilderResult;

pub struct InsertBuilder<'a> {
    dialect: &'a PodDialect,
    table: Table,
    rows: Vec<RowValues>,
}

impl<'a> InsertBuilder<'a> {
    pub fn new(dialect: &'a PodDialect, table: Table, rows: Vec<RowValues>) -> Self {
        Self { dialect, table, rows }
    }

    pub async fn execute(self) -> BuilderResult<Vec<WriteOutcome>> {
        Operation::insert(self.table.name.clone(), self.rows.clone())?;
        Ok(self.dialect.insert(self.rows, &self.table).await?)
    }
}
