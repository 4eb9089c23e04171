//! Data cleaning module.
//!
//! This module provides functionality for:
//! - Removing fully duplicate rows
//! - Measuring per-column missing percentages
//! - Dropping columns above a missing-value threshold

mod missing;

pub use missing::{PruneOutcome, missing_report, prune_columns};

use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// Stateless cleaner for record tables.
pub struct DataCleaner;

impl DataCleaner {
    /// Keep the first occurrence of every fully identical row.
    ///
    /// Survivors keep their original relative order and missing cells
    /// compare equal to each other. The input is left untouched.
    pub fn remove_duplicates(df: &DataFrame) -> Result<DataFrame> {
        let before = df.height();
        let deduped = df
            .clone()
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        let removed = before - deduped.height();
        if removed > 0 {
            let pct = removed as f64 / before as f64 * 100.0;
            debug!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        } else {
            debug!("No duplicate rows found");
        }

        Ok(deduped)
    }
}
