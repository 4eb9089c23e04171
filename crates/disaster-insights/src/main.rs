//! CLI entry point for the disaster insights pipeline.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use disaster_insights::disasters::{self, DashboardSelection};
use disaster_insights::utils::{column_names, frame_rows};
use disaster_insights::{
    AnalysisError, CrossTab, FrequencyTable, Pipeline, PipelineConfig, PipelineResult,
    RunReport, TimeCounts, aggregate,
};
use polars::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Cleaning and aggregation for EM-DAT disaster exports",
    long_about = "Cleans an EM-DAT style export (deduplication, removal of columns with \
                  too many missing values) and prints the aggregates behind the \
                  disaster dashboard.\n\n\
                  EXAMPLES:\n  \
                  # Clean a semicolon separated Latin-1 export\n  \
                  disaster-insights clean -i public_emdat.csv --save-original\n\n  \
                  # Most frequent disaster types in Asia since 2000\n  \
                  disaster-insights frequency -i public_emdat.csv --years 2000..2024 --region Asia\n\n  \
                  # Monthly pattern per subgroup as JSON\n  \
                  disaster-insights crosstab -i public_emdat.csv --json"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print JSON to stdout instead of text
    ///
    /// Disables all logs so stdout carries only the JSON document.
    #[arg(long, global = true)]
    json: bool,
}

/// How to read and clean the source file.
#[derive(Args, Debug)]
struct InputArgs {
    /// Path to the delimited source file
    #[arg(short, long)]
    input: PathBuf,

    /// Field separator
    #[arg(long, default_value_t = ';')]
    separator: char,

    /// Text encoding label (latin-1, utf-8, windows-1252, ...)
    #[arg(long, default_value = "latin-1")]
    encoding: String,

    /// Zero-based index of the header row
    #[arg(long, default_value_t = 0, conflicts_with = "no_header")]
    header_row: usize,

    /// The file has no header row
    #[arg(long)]
    no_header: bool,

    /// Drop columns with more than this percentage of missing values
    #[arg(short, long, default_value_t = 10.0)]
    threshold: f64,

    /// Keep fully duplicate rows
    #[arg(long)]
    keep_duplicates: bool,
}

impl InputArgs {
    fn config_builder(&self) -> disaster_insights::PipelineConfigBuilder {
        PipelineConfig::builder()
            .delimiter(self.separator)
            .encoding(&self.encoding)
            .header_row((!self.no_header).then_some(self.header_row))
            .missing_threshold(self.threshold)
            .remove_duplicates(!self.keep_duplicates)
    }
}

/// Dashboard sidebar filters applied to the cleaned table.
#[derive(Args, Debug)]
struct FilterArgs {
    /// Inclusive start year range, e.g. 1990..2020
    #[arg(long, value_parser = parse_year_range)]
    years: Option<(i64, i64)>,

    /// Keep only these regions (repeat or comma separate)
    #[arg(long, value_delimiter = ',')]
    region: Vec<String>,

    /// Keep only these disaster groups (repeat or comma separate)
    #[arg(long, value_delimiter = ',')]
    group: Vec<String>,
}

impl FilterArgs {
    fn selection(&self) -> DashboardSelection {
        DashboardSelection {
            years: self.years,
            regions: self.region.clone(),
            disaster_groups: self.group.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deduplicate, prune and write the CSV snapshots
    Clean {
        #[command(flatten)]
        input: InputArgs,

        /// Directory receiving the snapshots
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Also write the unpruned table
        #[arg(long)]
        save_original: bool,

        /// Do not write the pruned table
        #[arg(long)]
        no_save_cleaned: bool,

        /// File name of the unpruned snapshot
        #[arg(long, default_value = disaster_insights::config::DEFAULT_ORIGINAL_NAME)]
        original_name: String,

        /// File name of the pruned snapshot
        #[arg(long, default_value = disaster_insights::config::DEFAULT_CLEANED_NAME)]
        cleaned_name: String,

        /// Write <input_name>_report.json to the output directory
        #[arg(short = 'r', long)]
        emit_report: bool,
    },

    /// Show shape and per-column missing percentages without writing files
    Inspect {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Value counts of one column
    Frequency {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,

        /// Column to count
        #[arg(short, long, default_value = disasters::DISASTER_TYPE)]
        column: String,

        /// Only show the most frequent values
        #[arg(long)]
        top: Option<usize>,

        /// Leave the missing-value bucket out
        #[arg(long)]
        skip_missing: bool,
    },

    /// Regions of events by OFDA/BHA response
    Response {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,

        /// Response value to count regions for
        #[arg(long, default_value = "Yes", conflicts_with = "split")]
        value: String,

        /// Show Yes and No counts side by side per region
        #[arg(long)]
        split: bool,
    },

    /// Cross-tabulate an integer column against a categorical one
    Crosstab {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,

        /// Integer row column
        #[arg(long, default_value = disasters::START_MONTH)]
        rows: String,

        /// Categorical column column
        #[arg(long, default_value = disasters::DISASTER_SUBGROUP)]
        columns: String,
    },

    /// Event counts per time value
    Trend {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,

        /// Time column
        #[arg(long, default_value = disasters::START_YEAR)]
        time: String,
    },

    /// Occurrence and response summary per group, month and region
    Impact {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filters: FilterArgs,

        /// Only show the highest impact rows
        #[arg(long)]
        top: Option<usize>,
    },
}

fn parse_year_range(value: &str) -> std::result::Result<(i64, i64), String> {
    let (min, max) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{}'", value))?;
    let min: i64 = min
        .trim()
        .parse()
        .map_err(|_| format!("invalid start year '{}'", min))?;
    let max: i64 = max
        .trim()
        .parse()
        .map_err(|_| format!("invalid end year '{}'", max))?;
    if min > max {
        return Err(format!("start year {} is after end year {}", min, max));
    }
    Ok((min, max))
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet, cli.json);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                let body = match e.downcast_ref::<AnalysisError>() {
                    Some(err) => serde_json::to_value(err).unwrap_or_else(|_| json!({})),
                    None => json!({ "code": "ERROR", "message": e.to_string() }),
                };
                println!("{}", json!({ "error": body }));
            } else {
                error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Clean {
            input,
            output_dir,
            save_original,
            no_save_cleaned,
            original_name,
            cleaned_name,
            emit_report,
        } => {
            let config = input
                .config_builder()
                .output_dir(output_dir)
                .save_original(*save_original)
                .save_cleaned(!no_save_cleaned)
                .original_name(original_name)
                .cleaned_name(cleaned_name)
                .build()?;
            let pipeline = Pipeline::builder().config(config).build()?;

            info!("Loading dataset from: {}", input.input.display());
            let result = pipeline.process_file(&input.input)?;
            let report = RunReport::new(input.input.display().to_string(), &result.summary);

            if *emit_report {
                let path = pipeline
                    .reporter()
                    .write_report_to_file(&report, &report_stem(&input.input))?;
                debug!("Run report at {}", path.display());
            }

            if cli.json {
                println!("{}", report.to_json()?);
            } else {
                print_clean_summary(&report);
            }
            Ok(())
        }

        Command::Inspect { input } => {
            let result = process_in_memory(input)?;
            let report = RunReport::new(input.input.display().to_string(), &result.summary);
            if cli.json {
                println!("{}", report.to_json()?);
            } else {
                print_inspection(&report, &result.table);
            }
            Ok(())
        }

        Command::Frequency {
            input,
            filters,
            column,
            top,
            skip_missing,
        } => {
            let table = load_filtered(input, filters)?;
            let mut freq = aggregate::frequency(&table, column)?;
            if *skip_missing {
                freq = freq.without_missing();
            }
            if let Some(n) = top {
                freq = freq.top(*n);
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&freq)?);
            } else {
                print_frequency(&freq);
            }
            Ok(())
        }

        Command::Response {
            input,
            filters,
            value,
            split,
        } => {
            let table = load_filtered(input, filters)?;
            if *split {
                let rows = disasters::response_split(&table)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else {
                    print_header("OFDA/BHA RESPONSE BY REGION");
                    println!("{:<30} {:>8} {:>8}", "Region", "Yes", "No");
                    println!("{}", "-".repeat(48));
                    for row in &rows {
                        println!(
                            "{:<30} {:>8} {:>8}",
                            truncate_str(&row.region.to_string(), 29),
                            row.yes,
                            row.no
                        );
                    }
                }
            } else {
                let freq = disasters::response_by_region(&table, value)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&freq)?);
                } else {
                    print_frequency(&freq);
                }
            }
            Ok(())
        }

        Command::Crosstab {
            input,
            filters,
            rows,
            columns,
        } => {
            let table = load_filtered(input, filters)?;
            let tab = aggregate::cross_tab(&table, rows, columns)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&tab)?);
            } else {
                print_cross_tab(&tab);
            }
            Ok(())
        }

        Command::Trend {
            input,
            filters,
            time,
        } => {
            let table = load_filtered(input, filters)?;
            let series = aggregate::grouped_over_time(&table, time)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                print_trend(&series);
            }
            Ok(())
        }

        Command::Impact {
            input,
            filters,
            top,
        } => {
            let table = load_filtered(input, filters)?;
            let mut summary = disasters::impact_summary(&table)?;
            if let Some(n) = top {
                summary = summary
                    .sort(
                        [disasters::IMPACT_SCORE],
                        SortMultipleOptions::default()
                            .with_order_descending(true)
                            .with_maintain_order(true),
                    )?
                    .head(Some(*n));
            }
            if cli.json {
                let document = json!({
                    "columns": column_names(&summary),
                    "rows": frame_rows(&summary)?,
                });
                println!("{}", serde_json::to_string_pretty(&document)?);
            } else {
                print_header("IMPACT SUMMARY");
                println!("{}", summary);
            }
            Ok(())
        }
    }
}

/// Run the cleaning steps without writing snapshots.
fn process_in_memory(input: &InputArgs) -> Result<PipelineResult> {
    let config = input.config_builder().in_memory().build()?;
    let pipeline = Pipeline::builder().config(config).build()?;
    Ok(pipeline.process_file(&input.input)?)
}

/// Cleaned table restricted by the dashboard filters.
fn load_filtered(input: &InputArgs, filters: &FilterArgs) -> Result<DataFrame> {
    let result = process_in_memory(input)?;
    let selection = filters.selection();
    let table = selection.apply(&result.table)?;
    if table.height() == 0 && result.table.height() > 0 {
        info!("No rows match the selected filters");
    }
    Ok(table)
}

fn report_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

// ============================================================================
// Text output
// ============================================================================

fn print_header(title: &str) {
    println!("\n{}", "=".repeat(80));
    println!("{}", title);
    println!("{}\n", "=".repeat(80));
}

fn print_clean_summary(report: &RunReport) {
    print_header("CLEANING COMPLETE");
    println!("  Input: {}", report.input_file);
    println!(
        "  Loaded: {} rows x {} columns",
        report.original_shape.0, report.original_shape.1
    );
    println!(
        "  Duplicates removed: {} ({}%)",
        report.duplicates_removed, report.duplicate_percentage
    );
    println!(
        "  Columns dropped (> {}% missing): {}",
        report.missing_threshold,
        report.dropped_columns.len()
    );
    for name in &report.dropped_columns {
        println!("    - {}", name);
    }
    println!(
        "  Result: {} rows x {} columns",
        report.final_shape.0, report.final_shape.1
    );
    if let Some(path) = &report.original_snapshot {
        println!("  Original snapshot: {}", path.display());
    }
    if let Some(path) = &report.cleaned_snapshot {
        println!("  Cleaned snapshot: {}", path.display());
    }
    for warning in &report.warnings {
        println!("  Warning: {}", warning);
    }
    println!("  Duration: {} ms", report.duration_ms);
}

fn print_inspection(report: &RunReport, table: &DataFrame) {
    print_header("DATASET OVERVIEW");
    println!("  File: {}", report.input_file);
    println!(
        "  Rows: {} ({} duplicates)",
        report.original_shape.0, report.duplicates_removed
    );
    println!("  Columns: {}", report.original_shape.1);
    println!();

    println!("{:<40} {:>10} {:>10} {:>8}", "Column", "Missing", "Missing %", "Kept");
    println!("{}", "-".repeat(71));
    for col in &report.missing_report {
        let kept = !report.dropped_columns.contains(&col.name);
        println!(
            "{:<40} {:>10} {:>10.1} {:>8}",
            truncate_str(&col.name, 39),
            col.missing_count,
            col.missing_percentage,
            if kept { "yes" } else { "no" }
        );
    }
    println!();
    println!("  Retained columns: {}", column_names(table).join(", "));
}

fn print_frequency(freq: &FrequencyTable) {
    print_header(&format!("FREQUENCY OF {}", freq.column.to_uppercase()));
    println!("{:<40} {:>10} {:>8}", "Value", "Count", "Share %");
    println!("{}", "-".repeat(60));
    for (value, share) in freq.shares() {
        let count = freq.get(&value).unwrap_or(0);
        println!(
            "{:<40} {:>10} {:>8.1}",
            truncate_str(&value.to_string(), 39),
            count,
            share
        );
    }
    println!("{}", "-".repeat(60));
    println!("{:<40} {:>10}", "Total", freq.total());
}

fn print_cross_tab(tab: &CrossTab) {
    print_header(&format!(
        "{} BY {}",
        tab.column_column.to_uppercase(),
        tab.row_column.to_uppercase()
    ));
    if tab.is_empty() {
        println!("  (no rows)");
        return;
    }

    let mut header = format!("{:<10}", truncate_str(&tab.row_column, 9));
    for key in &tab.column_keys {
        header.push_str(&format!(" {:>14}", truncate_str(&key.to_string(), 14)));
    }
    header.push_str(&format!(" {:>8}", "Total"));
    println!("{}", header);
    println!("{}", "-".repeat(header.len()));

    for ((key, total), counts) in tab.row_totals().into_iter().zip(&tab.counts) {
        let mut line = format!("{:<10}", key);
        for count in counts {
            line.push_str(&format!(" {:>14}", count));
        }
        line.push_str(&format!(" {:>8}", total));
        println!("{}", line);
    }

    println!("{}", "-".repeat(header.len()));
    let mut footer = format!("{:<10}", "Total");
    for (_, total) in tab.column_totals() {
        footer.push_str(&format!(" {:>14}", total));
    }
    footer.push_str(&format!(" {:>8}", tab.total()));
    println!("{}", footer);
}

fn print_trend(series: &TimeCounts) {
    print_header(&format!("EVENTS PER {}", series.column.to_uppercase()));
    let max = series.iter().map(|(_, c)| c).max().unwrap_or(0);
    for (time, count) in series.iter() {
        let width = if max == 0 { 0 } else { count * 50 / max };
        println!("{:>10} {:>8} {}", time.to_string(), count, "#".repeat(width));
    }
    println!();
    println!("  Total: {} events", series.total());
    if let Some(peak) = series.peak() {
        println!("  Peak: {} ({} events)", peak.time, peak.count);
    }
}

/// Truncate a string for table display.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

