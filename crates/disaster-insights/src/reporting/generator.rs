use crate::error::{AnalysisError, Result, ResultExt};
use crate::types::{CleaningSummary, ColumnMissing};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Run report
// ============================================================================

/// JSON description of one pipeline run.
///
/// Used both for `--json` output on stdout and for the `<stem>_report.json`
/// file written next to the snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Local time the report was generated.
    pub generated_at: String,
    /// Source file the table was loaded from.
    pub input_file: String,

    /// `(rows, columns)` as loaded.
    pub original_shape: (usize, usize),
    /// `(rows, columns)` after deduplication and pruning.
    pub final_shape: (usize, usize),

    pub duplicates_removed: usize,
    /// Share of loaded rows that were duplicates, formatted with one decimal.
    pub duplicate_percentage: String,

    pub missing_threshold: f64,
    pub dropped_columns: Vec<String>,
    pub missing_report: Vec<ColumnMissing>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_snapshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_snapshot: Option<PathBuf>,

    pub duration_ms: u64,
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn new(input_file: impl Into<String>, summary: &CleaningSummary) -> Self {
        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.into(),
            original_shape: (summary.rows_loaded, summary.columns_loaded),
            final_shape: (summary.rows_after, summary.columns_after),
            duplicates_removed: summary.duplicates_removed,
            duplicate_percentage: format!("{:.1}", summary.duplicate_percentage()),
            missing_threshold: summary.missing_threshold,
            dropped_columns: summary.dropped_columns.clone(),
            missing_report: summary.missing_report.clone(),
            original_snapshot: summary.original_snapshot.clone(),
            cleaned_snapshot: summary.cleaned_snapshot.clone(),
            duration_ms: summary.duration_ms,
            warnings: summary.warnings.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Writes CSV snapshots and JSON reports under one output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `df` as `<output_dir>/<file_name>`.
    pub fn write_snapshot(&self, df: &DataFrame, file_name: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        Self::write_csv(df, &path)?;
        Ok(path)
    }

    /// Write `df` to `path` as UTF-8, comma separated, with a header row
    /// and no index column. Missing parent directories are created.
    pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| AnalysisError::from(e).with_context(parent.display().to_string()))?;
        }

        let mut file = File::create(path)
            .map_err(|e| AnalysisError::from(e).with_context(path.display().to_string()))?;
        let mut table = df.clone();

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut table)
            .context(format!("Failed to write {}", path.display()))?;

        info!(
            "Saved {} rows x {} columns to {}",
            table.height(),
            table.width(),
            path.display()
        );
        Ok(())
    }

    /// Write `report` as `<output_dir>/<report_base_name>_report.json`.
    pub fn write_report_to_file(&self, report: &RunReport, report_base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", report_base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(report.to_json()?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        debug!("Report covers {}", report.input_file);

        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn summary() -> CleaningSummary {
        CleaningSummary {
            duration_ms: 12,
            rows_loaded: 8,
            columns_loaded: 5,
            duplicates_removed: 2,
            rows_after: 6,
            columns_after: 4,
            missing_threshold: 10.0,
            dropped_columns: vec!["Appeal".to_string()],
            ..CleaningSummary::default()
        }
    }

    #[test]
    fn test_write_snapshot_creates_directories() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path().join("nested").join("out"));
        let df = df!(
            "Region" => &[Some("Asia"), None],
            "Start Year" => &[2001i64, 2002],
        )
        .unwrap();

        let path = generator.write_snapshot(&df, "snapshot.csv").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        assert_eq!(lines, vec!["Region,Start Year", "Asia,2001", ",2002"]);
    }

    #[test]
    fn test_write_snapshot_leaves_table_unchanged() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let table = df!("Region" => &["Asia", "Europe"]).unwrap();
        let before = table.clone();

        let path = generator
            .write_snapshot(&table, "data_columns_cleaned.csv")
            .unwrap();
        assert_eq!(path, dir.path().join("data_columns_cleaned.csv"));
        assert!(table.equals_missing(&before));
    }

    #[test]
    fn test_write_csv_quotes_separator() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quoted.csv");
        let df = df!("Location" => &["Lagos, Abuja"]).unwrap();

        ReportGenerator::write_csv(&df, &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"Lagos, Abuja\""));
    }

    #[test]
    fn test_run_report_from_summary() {
        let report = RunReport::new("public_emdat.csv", &summary());
        assert_eq!(report.original_shape, (8, 5));
        assert_eq!(report.final_shape, (6, 4));
        assert_eq!(report.duplicate_percentage, "25.0");
        assert_eq!(report.dropped_columns, vec!["Appeal".to_string()]);

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["input_file"], "public_emdat.csv");
        assert!(json.get("original_snapshot").is_none());
    }

    #[test]
    fn test_write_report_to_file() {
        let dir = TempDir::new().unwrap();
        let generator = ReportGenerator::new(dir.path());
        let report = RunReport::new("public_emdat.csv", &summary());

        let path = generator
            .write_report_to_file(&report, "public_emdat")
            .unwrap();
        assert_eq!(path, dir.path().join("public_emdat_report.json"));

        let restored: RunReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.duplicates_removed, 2);
    }
}
