//! Disaster Insights Library
//!
//! Cleaning and aggregation for EM-DAT style disaster event exports, built
//! on Polars.
//!
//! # Overview
//!
//! - **Loading**: delimited files in any `encoding_rs` label (Latin-1 by
//!   default), with a configurable delimiter and header row
//! - **Cleaning**: full-row deduplication and removal of columns whose
//!   missing percentage exceeds a threshold
//! - **Checkpoints**: CSV snapshots of the table before and after pruning
//! - **Aggregation**: frequency tables, conditional frequencies, integer
//!   cross-tabulations, time series counts and grouped summaries
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use disaster_insights::{Pipeline, PipelineConfig, aggregate, disasters};
//!
//! let config = PipelineConfig::builder()
//!     .delimiter(';')
//!     .encoding("latin-1")
//!     .missing_threshold(10.0)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .build()?
//!     .process_file("public_emdat.csv")?;
//!
//! let by_type = aggregate::frequency(&result.table, disasters::DISASTER_TYPE)?;
//! let by_month = aggregate::cross_tab(
//!     &result.table,
//!     disasters::START_MONTH,
//!     disasters::DISASTER_SUBGROUP,
//! )?;
//! ```
//!
//! All aggregators take column names as plain strings; [`disasters`] holds
//! the names used by EM-DAT exports.

pub mod aggregate;
pub mod cleaner;
pub mod config;
pub mod disasters;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{
    Aggregation, FilterCondition, TableFilter, conditional_frequency, cross_tab, cross_tab_frame,
    frequency, grouped_over_time, grouped_summary,
};
pub use cleaner::{DataCleaner, PruneOutcome, missing_report, prune_columns};
pub use config::{ConfigValidationError, LoadOptions, PipelineConfig, PipelineConfigBuilder};
pub use error::{AnalysisError, Result as AnalysisResult, ResultExt};
pub use loader::{load_csv, load_reader};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineResult};
pub use reporting::{ReportGenerator, RunReport};
pub use types::{
    Category, CleaningSummary, ColumnMissing, CrossTab, FrequencyEntry, FrequencyTable, TimeCount,
    TimeCounts,
};
