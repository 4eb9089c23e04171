//! Snapshot and run-report output.
//!
//! [`ReportGenerator`] writes the CSV checkpoints produced by the pipeline
//! and, on request, a [`RunReport`] describing the run as JSON.
//!
//! # Example
//!
//! ```rust,ignore
//! use disaster_insights::reporting::{ReportGenerator, RunReport};
//!
//! let generator = ReportGenerator::new("out");
//! generator.write_snapshot(&table, "data_columns_cleaned.csv")?;
//!
//! let report = RunReport::new("public_emdat.csv", &result.summary);
//! generator.write_report_to_file(&report, "public_emdat")?;
//! ```

mod generator;

pub use generator::{ReportGenerator, RunReport};
