//! Aggregations over a cleaned record table.
//!
//! Every function here is pure: it reads the table, never mutates it, and
//! returns the same output for the same input. Column names are taken as
//! given; the only requirement is that they exist in the table.

mod filter;
mod summary;

pub use filter::{FilterCondition, TableFilter};
pub use summary::{Aggregation, grouped_summary};

use crate::error::{AnalysisError, Result};
use crate::types::{Category, CrossTab, FrequencyTable, TimeCount, TimeCounts};
use crate::utils::{coerce_to_i64, column_categories, is_missing, require_column, to_category};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Count occurrences of each distinct value in `column`.
///
/// Missing cells are counted under [`Category::Missing`], so the counts sum
/// to the table's row count.
pub fn frequency(df: &DataFrame, column: &str) -> Result<FrequencyTable> {
    let values = column_categories(df, column)?;
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    Ok(FrequencyTable::from_counts(column, counts))
}

/// [`frequency`] of `group_column` over the rows where
/// `filter_column == filter_value`.
///
/// An empty restriction yields an empty table. A missing filter value never
/// matches, including against missing cells.
pub fn conditional_frequency(
    df: &DataFrame,
    filter_column: &str,
    filter_value: &Category,
    group_column: &str,
) -> Result<FrequencyTable> {
    let filter_values = column_categories(df, filter_column)?;
    let group_values = column_categories(df, group_column)?;

    let mut counts: HashMap<Category, usize> = HashMap::new();
    if !filter_value.is_missing() {
        for (candidate, group) in filter_values.iter().zip(group_values) {
            if candidate == filter_value {
                *counts.entry(group).or_insert(0) += 1;
            }
        }
    }

    debug!(
        "{} rows with {} == {}",
        counts.values().sum::<usize>(),
        filter_column,
        filter_value
    );
    Ok(FrequencyTable::from_counts(group_column, counts))
}

/// Cross-tabulate `row_column` against `column_column`.
///
/// Rows whose `row_column` value is missing are excluded; missing values in
/// `column_column` are kept as their own category. Remaining row values are
/// coerced to integers.
///
/// # Errors
///
/// [`AnalysisError::TypeCoercion`] if a retained row value is not
/// convertible to an integer.
pub fn cross_tab(df: &DataFrame, row_column: &str, column_column: &str) -> Result<CrossTab> {
    let row_series = require_column(df, row_column)?;
    let column_values = column_categories(df, column_column)?;

    let mut cells: BTreeMap<(i64, Category), usize> = BTreeMap::new();
    let mut row_keys: BTreeSet<i64> = BTreeSet::new();
    let mut column_keys: BTreeSet<Category> = BTreeSet::new();
    let mut excluded = 0usize;

    for (idx, column_value) in column_values.into_iter().enumerate() {
        let raw = row_series.get(idx)?;
        if is_missing(&raw) {
            excluded += 1;
            continue;
        }
        let row_key = coerce_to_i64(&raw).ok_or_else(|| AnalysisError::TypeCoercion {
            column: row_column.to_string(),
            value: to_category(&raw).to_string(),
        })?;

        row_keys.insert(row_key);
        column_keys.insert(column_value.clone());
        *cells.entry((row_key, column_value)).or_insert(0) += 1;
    }

    if excluded > 0 {
        debug!(
            "Cross-tab excluded {} rows with missing '{}'",
            excluded, row_column
        );
    }

    let row_keys: Vec<i64> = row_keys.into_iter().collect();
    let column_keys: Vec<Category> = column_keys.into_iter().collect();
    let counts = row_keys
        .iter()
        .map(|row| {
            column_keys
                .iter()
                .map(|col| cells.get(&(*row, col.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        row_column: row_column.to_string(),
        column_column: column_column.to_string(),
        row_keys,
        column_keys,
        counts,
    })
}

/// Row counts per distinct value of `time_column`, ascending by time.
///
/// Rows with a missing time value are not counted.
pub fn grouped_over_time(df: &DataFrame, time_column: &str) -> Result<TimeCounts> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for value in column_categories(df, time_column)? {
        if value.is_missing() {
            continue;
        }
        *counts.entry(value).or_insert(0) += 1;
    }

    Ok(TimeCounts {
        column: time_column.to_string(),
        points: counts
            .into_iter()
            .map(|(time, count)| TimeCount { time, count })
            .collect(),
    })
}

/// Render a cross-tab as a table: one row per row key, one count column
/// per column key.
pub fn cross_tab_frame(tab: &CrossTab) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(tab.column_keys.len() + 1);
    columns.push(Column::new(
        tab.row_column.as_str().into(),
        tab.row_keys.clone(),
    ));
    for (c, key) in tab.column_keys.iter().enumerate() {
        let values: Vec<u64> = tab.counts.iter().map(|row| row[c] as u64).collect();
        columns.push(Column::new(key.to_string().as_str().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}
