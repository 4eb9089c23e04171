//! Row filters matching the dashboard's sidebar controls: a year range
//! slider and multi-select lists, AND-combined.

use crate::error::Result;
use crate::types::Category;
use crate::utils::{coerce_to_i64, column_categories, is_missing, require_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single row predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    /// Integer value within `[min, max]`, both inclusive.
    Between { column: String, min: i64, max: i64 },
    /// Value equal to one of `values`.
    OneOf { column: String, values: Vec<Category> },
}

impl FilterCondition {
    fn mask(&self, df: &DataFrame) -> Result<Vec<bool>> {
        match self {
            FilterCondition::Between { column, min, max } => {
                let series = require_column(df, column)?;
                let mut mask = Vec::with_capacity(series.len());
                for idx in 0..series.len() {
                    let value = series.get(idx)?;
                    let keep = !is_missing(&value)
                        && coerce_to_i64(&value).is_some_and(|v| (*min..=*max).contains(&v));
                    mask.push(keep);
                }
                Ok(mask)
            }
            FilterCondition::OneOf { column, values } => Ok(column_categories(df, column)?
                .into_iter()
                .map(|value| !value.is_missing() && values.contains(&value))
                .collect()),
        }
    }
}

/// Conjunction of [`FilterCondition`]s. An empty filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFilter {
    pub conditions: Vec<FilterCondition>,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` holds an integer in `[min, max]`.
    pub fn between(mut self, column: impl Into<String>, min: i64, max: i64) -> Self {
        self.conditions.push(FilterCondition::Between {
            column: column.into(),
            min,
            max,
        });
        self
    }

    /// Keep rows whose `column` equals one of `values`.
    pub fn one_of<I, V>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Category>,
    {
        self.conditions.push(FilterCondition::OneOf {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Return a new table with the rows satisfying every condition.
    ///
    /// Missing values never satisfy a condition. Unknown columns fail with
    /// [`crate::AnalysisError::ColumnNotFound`].
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.conditions.is_empty() {
            return Ok(df.clone());
        }

        let mut keep = vec![true; df.height()];
        for condition in &self.conditions {
            for (slot, pass) in keep.iter_mut().zip(condition.mask(df)?) {
                *slot &= pass;
            }
        }

        let mask = BooleanChunked::from_slice("mask".into(), &keep);
        let filtered = df.filter(&mask)?;
        debug!(
            "Filter kept {} of {} rows",
            filtered.height(),
            df.height()
        );
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    fn disasters() -> DataFrame {
        df!(
            "Start Year" => &[Some(1995i64), Some(2000), Some(2005), None, Some(2010)],
            "Region" => &[Some("Asia"), Some("Africa"), Some("Asia"), Some("Asia"), None],
            "Disaster Group" => &["Natural", "Natural", "Technological", "Natural", "Natural"],
        )
        .unwrap()
    }

    #[test]
    fn test_empty_filter_keeps_all_rows() {
        let df = disasters();
        let filtered = TableFilter::new().apply(&df).unwrap();
        assert_eq!(filtered.height(), df.height());
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let filtered = TableFilter::new()
            .between("Start Year", 2000, 2010)
            .apply(&disasters())
            .unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn test_conditions_combine() {
        let filtered = TableFilter::new()
            .between("Start Year", 1990, 2010)
            .one_of("Region", ["Asia"])
            .one_of("Disaster Group", ["Natural"])
            .apply(&disasters())
            .unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn test_missing_values_never_match() {
        let filtered = TableFilter::new()
            .one_of("Region", ["Asia", "Africa"])
            .apply(&disasters())
            .unwrap();
        assert_eq!(filtered.height(), 4);

        let filtered = TableFilter::new()
            .between("Start Year", i64::MIN, i64::MAX)
            .apply(&disasters())
            .unwrap();
        assert_eq!(filtered.height(), 4);
    }

    #[test]
    fn test_unknown_column() {
        let result = TableFilter::new()
            .one_of("Subregion", ["Asia"])
            .apply(&disasters());
        assert!(matches!(result, Err(AnalysisError::ColumnNotFound(_))));
    }
}
