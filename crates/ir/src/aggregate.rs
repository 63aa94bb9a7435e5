//! # Aggregate descriptors
//!
//! `count`, `sum`, `avg`, `min`, `max` over a column, with an optional
//! `distinct` flag. Only `count` may omit its column (`count(*)`); the other
//! four require one, checked at construction time.

use serde::{Deserialize, Serialize};

use crate::condition::ColumnRef;
use crate::error::{IrError, IrResult};

/// The aggregate function applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// A single aggregate select-field: function, optional source column, and
/// whether duplicate values are collapsed before aggregating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub func: AggregateFunc,
    pub column: Option<ColumnRef>,
    pub distinct: bool,
    /// Output field name; defaults to `"<func>_<column>"` or `"count"` for
    /// `count(*)` if not overridden via [`Aggregate::as_alias`].
    pub alias: Option<String>,
}

impl Aggregate {
    /// `count(*)`, or `count(column)` if `column` is given.
    pub fn count(column: Option<ColumnRef>) -> Self {
        Self {
            func: AggregateFunc::Count,
            column,
            distinct: false,
            alias: None,
        }
    }

    /// Build a `sum`/`avg`/`min`/`max` aggregate over `column`. Fails with
    /// [`IrError::AggregateMissingColumn`] only when called through
    /// [`Aggregate::new`] with `func == Count` and no column is meaningful to
    /// require; direct callers should prefer [`Aggregate::count`],
    /// [`Aggregate::sum`], etc.
    pub fn new(func: AggregateFunc, column: Option<ColumnRef>) -> IrResult<Self> {
        if func != AggregateFunc::Count && column.is_none() {
            return Err(IrError::AggregateMissingColumn(func));
        }
        Ok(Self {
            func,
            column,
            distinct: false,
            alias: None,
        })
    }

    pub fn sum(column: impl Into<ColumnRef>) -> Self {
        Self {
            func: AggregateFunc::Sum,
            column: Some(column.into()),
            distinct: false,
            alias: None,
        }
    }

    pub fn avg(column: impl Into<ColumnRef>) -> Self {
        Self {
            func: AggregateFunc::Avg,
            column: Some(column.into()),
            distinct: false,
            alias: None,
        }
    }

    pub fn min(column: impl Into<ColumnRef>) -> Self {
        Self {
            func: AggregateFunc::Min,
            column: Some(column.into()),
            distinct: false,
            alias: None,
        }
    }

    pub fn max(column: impl Into<ColumnRef>) -> Self {
        Self {
            func: AggregateFunc::Max,
            column: Some(column.into()),
            distinct: false,
            alias: None,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn as_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The output field name this aggregate projects to.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        let func_name = match self.func {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        };
        match &self.column {
            Some(col) => format!("{}_{}", func_name, col.column),
            None => func_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_star_has_no_column() {
        let agg = Aggregate::count(None);
        assert!(agg.column.is_none());
        assert_eq!(agg.output_name(), "count");
    }

    #[test]
    fn sum_requires_column_via_constructor() {
        let agg = Aggregate::sum("age");
        assert_eq!(agg.output_name(), "sum_age");
    }

    #[test]
    fn new_rejects_non_count_without_column() {
        let result = Aggregate::new(AggregateFunc::Sum, None);
        assert!(matches!(result, Err(IrError::AggregateMissingColumn(AggregateFunc::Sum))));
    }

    #[test]
    fn new_allows_count_without_column() {
        let result = Aggregate::new(AggregateFunc::Count, None);
        assert!(result.is_ok());
    }

    #[test]
    fn alias_overrides_output_name() {
        let agg = Aggregate::avg("age").as_alias("averageAge");
        assert_eq!(agg.output_name(), "averageAge");
    }

    #[test]
    fn distinct_flag_is_set() {
        let agg = Aggregate::count(Some(ColumnRef::new("id"))).distinct();
        assert!(agg.distinct);
    }
}
