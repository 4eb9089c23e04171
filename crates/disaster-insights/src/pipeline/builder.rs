//! Main cleaning pipeline.
//!
//! This module provides the `Pipeline` struct and its builder for running
//! the load, deduplicate, prune and checkpoint sequence.

use crate::cleaner::{DataCleaner, missing_report, prune_columns};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::Result;
use crate::loader::load_csv;
use crate::reporting::ReportGenerator;
use crate::types::CleaningSummary;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Cleaned table plus a summary of what was done to it.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Deduplicated table without the high-missing columns.
    pub table: DataFrame,
    pub summary: CleaningSummary,
}

/// The cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use disaster_insights::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().missing_threshold(10.0).build()?)
///     .build()?
///     .process_file("public_emdat.csv")?;
///
/// println!("{} rows kept", result.summary.rows_after);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    reporter: ReportGenerator,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load `path` with the configured [`crate::LoadOptions`] and clean it.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<PipelineResult> {
        let path = path.as_ref();
        let df = load_csv(path, &self.config.load).map_err(|e| {
            error!("Pipeline error: {}", e);
            e
        })?;
        self.process(df)
    }

    /// Clean an already loaded table.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.process_internal(df).map_err(|e| {
            error!("Pipeline error: {}", e);
            e
        })
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        info!("Starting cleaning pipeline...");

        let mut summary = CleaningSummary::new();
        summary.rows_loaded = df.height();
        summary.columns_loaded = df.width();
        summary.missing_threshold = self.config.missing_threshold;

        if df.height() == 0 {
            summary.add_warning("Loaded table has no rows");
            warn!("Loaded table has no rows");
        }

        // Step 1: Deduplicate
        let deduped = if self.config.remove_duplicates {
            DataCleaner::remove_duplicates(&df)?
        } else {
            df
        };
        summary.duplicates_removed = summary.rows_loaded - deduped.height();
        if summary.duplicates_removed > 0 {
            info!(
                "Removed {} duplicate rows ({:.1}%)",
                summary.duplicates_removed,
                summary.duplicate_percentage()
            );
        }

        // Step 2: Checkpoint the unpruned table
        if self.config.save_original {
            let path = self.config.original_path();
            self.write_checkpoint(&deduped, &path, &mut summary)?;
            summary.original_snapshot = Some(path);
        }

        // Step 3: Prune high-missing columns
        summary.missing_report = missing_report(&deduped);
        let outcome = prune_columns(&deduped, self.config.missing_threshold)?;
        if outcome.table.width() == 0 && outcome.rows > 0 {
            summary.add_warning(format!(
                "Every column exceeded {}% missing values; the cleaned table has no columns",
                self.config.missing_threshold
            ));
        }

        // Step 4: Checkpoint the pruned table
        if self.config.save_cleaned {
            let path = self.config.cleaned_path();
            self.write_checkpoint(&outcome.table, &path, &mut summary)?;
            summary.cleaned_snapshot = Some(path);
        }

        summary.rows_after = outcome.rows;
        summary.columns_after = outcome.table.width();
        summary.dropped_columns = outcome.dropped_columns;
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline finished in {} ms: {} rows x {} columns",
            summary.duration_ms, summary.rows_after, summary.columns_after
        );

        Ok(PipelineResult {
            table: outcome.table,
            summary,
        })
    }

    /// Write one snapshot. A zero-width table has nothing to serialize, so
    /// an empty file is created in its place.
    fn write_checkpoint(
        &self,
        df: &DataFrame,
        path: &Path,
        summary: &mut CleaningSummary,
    ) -> Result<()> {
        if df.width() == 0 {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            File::create(path)?;
            summary.add_warning(format!("Wrote empty snapshot {}", path.display()));
            return Ok(());
        }
        ReportGenerator::write_csv(df, path)
    }

    /// Generator writing under this pipeline's output directory.
    pub fn reporter(&self) -> &ReportGenerator {
        &self.reporter
    }
}

/// Builder for creating a [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.output_dir.clone());

        Ok(Pipeline { config, reporter })
    }
}
