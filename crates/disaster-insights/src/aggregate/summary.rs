//! Per-group summaries over one or more key columns.

use crate::error::{AnalysisError, Result};
use crate::utils::require_column;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// One output column of [`grouped_summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Smallest non-missing value of `column`.
    Min { column: String, alias: String },
    /// Largest non-missing value of `column`.
    Max { column: String, alias: String },
    /// Number of non-missing values of `column`.
    Present { column: String, alias: String },
}

impl Aggregation {
    pub fn min(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Aggregation::Min {
            column: column.into(),
            alias: alias.into(),
        }
    }

    pub fn max(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Aggregation::Max {
            column: column.into(),
            alias: alias.into(),
        }
    }

    pub fn present(column: impl Into<String>, alias: impl Into<String>) -> Self {
        Aggregation::Present {
            column: column.into(),
            alias: alias.into(),
        }
    }

    fn source_column(&self) -> &str {
        match self {
            Aggregation::Min { column, .. }
            | Aggregation::Max { column, .. }
            | Aggregation::Present { column, .. } => column.as_str(),
        }
    }

    fn to_expr(&self) -> Expr {
        match self {
            Aggregation::Min { column, alias } => col(column.as_str()).min().alias(alias.as_str()),
            Aggregation::Max { column, alias } => col(column.as_str()).max().alias(alias.as_str()),
            Aggregation::Present { column, alias } => {
                col(column.as_str()).count().alias(alias.as_str())
            }
        }
    }
}

/// Group by `keys` and compute `aggregations` per group.
///
/// Rows with a missing value in any key column are left out. Groups appear
/// in the order their first row appears in the input; the output holds the
/// key columns followed by one column per aggregation.
pub fn grouped_summary(
    df: &DataFrame,
    keys: &[&str],
    aggregations: &[Aggregation],
) -> Result<DataFrame> {
    if keys.is_empty() {
        return Err(AnalysisError::InvalidConfig(
            "grouped summary needs at least one key column".to_string(),
        ));
    }
    for key in keys {
        require_column(df, key)?;
    }
    for agg in aggregations {
        require_column(df, agg.source_column())?;
    }

    let by: Vec<Expr> = keys.iter().map(|k| col(*k)).collect();
    let exprs: Vec<Expr> = aggregations.iter().map(Aggregation::to_expr).collect();
    let keys_present = keys
        .iter()
        .map(|k| col(*k).is_not_null())
        .reduce(|acc, e| acc.and(e))
        .unwrap_or_else(|| lit(true));

    let summary = df
        .clone()
        .lazy()
        .filter(keys_present)
        .group_by_stable(by)
        .agg(exprs)
        .collect()?;

    Ok(summary)
}
