//! Missing-value measurement and threshold-based column pruning.

use crate::error::Result;
use crate::types::ColumnMissing;
use crate::utils::missing_count;
use polars::prelude::*;
use tracing::info;

/// Result of [`prune_columns`].
#[derive(Debug, Clone)]
pub struct PruneOutcome {
    /// The table without the dropped columns.
    pub table: DataFrame,
    /// Dropped column names, in source order.
    pub dropped_columns: Vec<String>,
    /// Row count of the input. Preserved even when every column is dropped
    /// and `table` has zero width.
    pub rows: usize,
}

/// Missing count and percentage of every column, in table order.
///
/// NaN in float columns counts as missing, matching how aggregation buckets
/// cells. The percentage is `missing / rows * 100`, and 0 for a table with
/// no rows.
pub fn missing_report(df: &DataFrame) -> Vec<ColumnMissing> {
    let rows = df.height();
    df.get_columns()
        .iter()
        .map(|col| {
            let missing_count = missing_count(col.as_materialized_series());
            let missing_percentage = if rows == 0 {
                0.0
            } else {
                missing_count as f64 / rows as f64 * 100.0
            };
            ColumnMissing {
                name: col.name().to_string(),
                missing_count,
                missing_percentage,
            }
        })
        .collect()
}

/// Drop every column whose missing percentage is strictly above `threshold`.
///
/// The decision is made once per column from percentages measured on the
/// input; dropping one column never changes another's percentage.
pub fn prune_columns(df: &DataFrame, threshold: f64) -> Result<PruneOutcome> {
    info!("Cleaning data...");

    let dropped_columns: Vec<String> = missing_report(df)
        .into_iter()
        .filter(|col| col.missing_percentage > threshold)
        .map(|col| col.name)
        .collect();

    let table = if dropped_columns.is_empty() {
        df.clone()
    } else {
        let cols_ref: Vec<PlSmallStr> = dropped_columns
            .iter()
            .map(|s| s.as_str().into())
            .collect();
        df.drop_many(cols_ref)
    };

    info!(
        "Dropped {} columns with more than {}% missing values.",
        dropped_columns.len(),
        threshold
    );

    Ok(PruneOutcome {
        table,
        dropped_columns,
        rows: df.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Ten rows; "X" has 3 missing, "Y" has none, "Z" has 10.
    fn sample() -> DataFrame {
        let x: Vec<Option<i64>> = (0..10).map(|i| if i < 3 { None } else { Some(i) }).collect();
        let y: Vec<i64> = (0..10).collect();
        let z: Vec<Option<&str>> = vec![None; 10];
        df!("X" => x, "Y" => y, "Z" => z).unwrap()
    }

    #[test]
    fn test_missing_report() {
        let report = missing_report(&sample());
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].name, "X");
        assert_eq!(report[0].missing_count, 3);
        assert!((report[0].missing_percentage - 30.0).abs() < 1e-9);
        assert_eq!(report[1].missing_percentage, 0.0);
        assert_eq!(report[2].missing_percentage, 100.0);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let df = df!(
            "Magnitude" => &[f64::NAN, f64::NAN, 7.1, f64::NAN],
            "Region" => &["Asia", "Asia", "Africa", "Europe"],
        )
        .unwrap();

        let report = missing_report(&df);
        assert_eq!(report[0].missing_count, 3);
        assert_eq!(report[0].missing_percentage, 75.0);

        let outcome = prune_columns(&df, 10.0).unwrap();
        assert_eq!(outcome.dropped_columns, vec!["Magnitude".to_string()]);
        assert!(outcome.table.column("Region").is_ok());
    }

    #[test]
    fn test_nan_and_null_share_a_count() {
        let df = df!("Magnitude" => &[Some(f64::NAN), None, Some(6.5), Some(5.0)]).unwrap();
        let report = missing_report(&df);
        assert_eq!(report[0].missing_count, 2);
        assert_eq!(report[0].missing_percentage, 50.0);
    }

    #[test]
    fn test_missing_report_empty_table() {
        let df = df!("X" => Vec::<i64>::new()).unwrap();
        let report = missing_report(&df);
        assert_eq!(report[0].missing_percentage, 0.0);
    }

    #[test]
    fn test_threshold_ten_drops_x() {
        let outcome = prune_columns(&sample(), 10.0).unwrap();
        assert_eq!(outcome.dropped_columns, vec!["X".to_string(), "Z".to_string()]);
        assert!(outcome.table.column("X").is_err());
        assert!(outcome.table.column("Y").is_ok());
        assert_eq!(outcome.rows, 10);
    }

    #[test]
    fn test_threshold_fifty_retains_x() {
        let outcome = prune_columns(&sample(), 50.0).unwrap();
        assert_eq!(outcome.dropped_columns, vec!["Z".to_string()]);
        assert!(outcome.table.column("X").is_ok());
    }

    #[test]
    fn test_threshold_is_strict() {
        // 30% missing is not strictly above a 30% threshold.
        let outcome = prune_columns(&sample(), 30.0).unwrap();
        assert!(outcome.table.column("X").is_ok());
    }

    #[test]
    fn test_retained_and_dropped_respect_threshold() {
        let df = sample();
        for threshold in [0.0, 10.0, 30.0, 50.0, 99.0, 100.0] {
            let outcome = prune_columns(&df, threshold).unwrap();
            let report = missing_report(&df);
            for col in &report {
                let dropped = outcome.dropped_columns.contains(&col.name);
                assert_eq!(dropped, col.missing_percentage > threshold);
                assert_eq!(outcome.table.column(&col.name).is_ok(), !dropped);
            }
        }
    }

    #[test]
    fn test_all_columns_dropped_keeps_row_count() {
        let df = df!(
            "A" => vec![None::<i64>; 4],
            "B" => vec![None::<&str>; 4],
        )
        .unwrap();
        let outcome = prune_columns(&df, 0.0).unwrap();
        assert_eq!(outcome.table.width(), 0);
        assert_eq!(outcome.rows, 4);
        assert_eq!(outcome.dropped_columns.len(), 2);
    }

    #[test]
    fn test_column_order_preserved() {
        let df = df!(
            "A" => &[1i64, 2],
            "B" => &[None::<i64>, None],
            "C" => &[3i64, 4],
        )
        .unwrap();
        let outcome = prune_columns(&df, 10.0).unwrap();
        let names: Vec<String> = outcome
            .table
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["A".to_string(), "C".to_string()]);
    }
}
