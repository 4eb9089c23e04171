//! Shared helpers for turning polars cells into aggregate keys.

use crate::error::{AnalysisError, Result};
use crate::types::Category;
use polars::prelude::*;

// =============================================================================
// Column Access
// =============================================================================

/// Look up a column, mapping absence to [`AnalysisError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| AnalysisError::ColumnNotFound(name.to_string()))
}

/// Column names in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Value Conversion
// =============================================================================

/// Whether a cell counts as missing. NaN is treated like null.
pub fn is_missing(value: &AnyValue) -> bool {
    match value {
        AnyValue::Null => true,
        AnyValue::Float32(f) => f.is_nan(),
        AnyValue::Float64(f) => f.is_nan(),
        _ => false,
    }
}

/// Number of missing cells in a column, counting float NaN alongside nulls.
pub fn missing_count(series: &Series) -> usize {
    let nan_count = match series.dtype() {
        DataType::Float32 | DataType::Float64 => series
            .is_nan()
            .map(|mask| mask.num_trues())
            .unwrap_or(0),
        _ => 0,
    };
    series.null_count() + nan_count
}

/// Convert a float to a category: integral values become `Int`.
fn float_category(f: f64) -> Category {
    if f.is_nan() {
        Category::Missing
    } else if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Category::Int(f as i64)
    } else {
        Category::Text(f.to_string())
    }
}

/// Convert a single cell to its aggregate key.
pub fn to_category(value: &AnyValue) -> Category {
    match value {
        AnyValue::Null => Category::Missing,
        AnyValue::Boolean(b) => Category::Text(b.to_string()),
        AnyValue::String(s) => Category::Text(s.to_string()),
        AnyValue::StringOwned(s) => Category::Text(s.to_string()),
        AnyValue::Int8(n) => Category::Int(*n as i64),
        AnyValue::Int16(n) => Category::Int(*n as i64),
        AnyValue::Int32(n) => Category::Int(*n as i64),
        AnyValue::Int64(n) => Category::Int(*n),
        AnyValue::UInt8(n) => Category::Int(*n as i64),
        AnyValue::UInt16(n) => Category::Int(*n as i64),
        AnyValue::UInt32(n) => Category::Int(*n as i64),
        AnyValue::UInt64(n) => match i64::try_from(*n) {
            Ok(v) => Category::Int(v),
            Err(_) => Category::Text(n.to_string()),
        },
        AnyValue::Float32(f) => float_category(*f as f64),
        AnyValue::Float64(f) => float_category(*f),
        other => Category::Text(other.to_string().trim_matches('"').to_string()),
    }
}

/// Coerce a non-missing cell to an integer the way a cast to `int` would:
/// floats truncate toward zero, booleans map to 0/1 and strings must hold a
/// base-10 integer.
pub fn coerce_to_i64(value: &AnyValue) -> Option<i64> {
    match value {
        AnyValue::Boolean(b) => Some(*b as i64),
        AnyValue::Int8(n) => Some(*n as i64),
        AnyValue::Int16(n) => Some(*n as i64),
        AnyValue::Int32(n) => Some(*n as i64),
        AnyValue::Int64(n) => Some(*n),
        AnyValue::UInt8(n) => Some(*n as i64),
        AnyValue::UInt16(n) => Some(*n as i64),
        AnyValue::UInt32(n) => Some(*n as i64),
        AnyValue::UInt64(n) => i64::try_from(*n).ok(),
        AnyValue::Float32(f) => truncate_float(*f as f64),
        AnyValue::Float64(f) => truncate_float(*f),
        AnyValue::String(s) => s.trim().parse::<i64>().ok(),
        AnyValue::StringOwned(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn truncate_float(f: f64) -> Option<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

/// All cells of a column as categories, in row order.
pub fn column_categories(df: &DataFrame, name: &str) -> Result<Vec<Category>> {
    let series = require_column(df, name)?;
    let mut values = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        values.push(to_category(&series.get(idx)?));
    }
    Ok(values)
}

/// Every row of the table as categories, in row then column order.
pub fn frame_rows(df: &DataFrame) -> Result<Vec<Vec<Category>>> {
    let mut rows = vec![Vec::with_capacity(df.width()); df.height()];
    for name in column_names(df) {
        for (row, value) in rows.iter_mut().zip(column_categories(df, &name)?) {
            row.push(value);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_column() {
        let df = df!("Region" => &["Asia", "Africa"]).unwrap();
        assert!(require_column(&df, "Region").is_ok());
        assert!(matches!(
            require_column(&df, "ISO"),
            Err(AnalysisError::ColumnNotFound(name)) if name == "ISO"
        ));
    }

    #[test]
    fn test_to_category() {
        assert_eq!(to_category(&AnyValue::Null), Category::Missing);
        assert_eq!(to_category(&AnyValue::Int64(2001)), Category::Int(2001));
        assert_eq!(to_category(&AnyValue::Float64(3.0)), Category::Int(3));
        assert_eq!(
            to_category(&AnyValue::Float64(2.5)),
            Category::Text("2.5".to_string())
        );
        assert_eq!(to_category(&AnyValue::Float64(f64::NAN)), Category::Missing);
        assert_eq!(
            to_category(&AnyValue::String("Flood")),
            Category::Text("Flood".to_string())
        );
        assert_eq!(
            to_category(&AnyValue::Boolean(true)),
            Category::Text("true".to_string())
        );
    }

    #[test]
    fn test_missing_count_agrees_with_is_missing() {
        let df = df!(
            "Magnitude" => &[Some(f64::NAN), None, Some(7.1), Some(f64::NAN)],
            "Region" => &[Some("Asia"), None, Some("Africa"), Some("Asia")],
        )
        .unwrap();

        for name in ["Magnitude", "Region"] {
            let series = require_column(&df, name).unwrap();
            let by_cell = series.iter().filter(|v| is_missing(v)).count();
            assert_eq!(missing_count(series), by_cell, "{}", name);
        }
        assert_eq!(missing_count(require_column(&df, "Magnitude").unwrap()), 3);
    }

    #[test]
    fn test_coerce_to_i64() {
        assert_eq!(coerce_to_i64(&AnyValue::Int32(7)), Some(7));
        assert_eq!(coerce_to_i64(&AnyValue::Float64(7.9)), Some(7));
        assert_eq!(coerce_to_i64(&AnyValue::Float64(-7.9)), Some(-7));
        assert_eq!(coerce_to_i64(&AnyValue::String(" 12 ")), Some(12));
        assert_eq!(coerce_to_i64(&AnyValue::Boolean(true)), Some(1));
        assert_eq!(coerce_to_i64(&AnyValue::String("March")), None);
        assert_eq!(coerce_to_i64(&AnyValue::Float64(f64::INFINITY)), None);
    }

    #[test]
    fn test_is_missing() {
        assert!(is_missing(&AnyValue::Null));
        assert!(is_missing(&AnyValue::Float64(f64::NAN)));
        assert!(!is_missing(&AnyValue::Int64(0)));
        assert!(!is_missing(&AnyValue::String("")));
    }

    #[test]
    fn test_column_categories_with_nulls() {
        let df = df!("Start Month" => &[Some(1i64), None, Some(3)]).unwrap();
        let values = column_categories(&df, "Start Month").unwrap();
        assert_eq!(
            values,
            vec![Category::Int(1), Category::Missing, Category::Int(3)]
        );
    }

    #[test]
    fn test_frame_rows() {
        let df = df!(
            "Region" => &[Some("Asia"), None],
            "Start Year" => &[2001i64, 2002],
        )
        .unwrap();
        assert_eq!(
            frame_rows(&df).unwrap(),
            vec![
                vec![Category::text("Asia"), Category::Int(2001)],
                vec![Category::Missing, Category::Int(2002)],
            ]
        );
    }
}
