//! Configuration types for the cleaning pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default file name for the deduplicated, unpruned snapshot.
pub const DEFAULT_ORIGINAL_NAME: &str = "data_all_columns.csv";

/// Default file name for the pruned snapshot.
pub const DEFAULT_CLEANED_NAME: &str = "data_columns_cleaned.csv";

/// How to read a delimited source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field delimiter. Must be a single ASCII character.
    /// Default: ';'
    pub delimiter: char,

    /// Encoding label of the source ("latin-1", "utf-8", ...), see
    /// [`LoadOptions::resolve_encoding`] for accepted spellings.
    /// Default: "latin-1"
    pub encoding: String,

    /// Zero-based line index of the header row. `None` means the file has
    /// no header and columns are named automatically.
    /// Default: Some(0)
    pub header_row: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ';',
            encoding: "latin-1".to_string(),
            header_row: Some(0),
        }
    }
}

impl LoadOptions {
    /// Options for a comma-delimited UTF-8 file with a header on the first line.
    pub fn comma_utf8() -> Self {
        Self {
            delimiter: ',',
            encoding: "utf-8".to_string(),
            header_row: Some(0),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_header_row(mut self, header_row: Option<usize>) -> Self {
        self.header_row = header_row;
        self
    }

    /// Resolve the encoding label.
    ///
    /// Common spellings outside the WHATWG label table ("latin-1",
    /// "latin_1", "iso_8859_1", "UTF_8") are accepted by retrying with
    /// underscores turned into hyphens and then with separators removed.
    pub fn resolve_encoding(&self) -> Result<&'static Encoding, ConfigValidationError> {
        let label = self.encoding.trim();
        let hyphenated = label.replace('_', "-");
        let compact: String = label.chars().filter(|c| !matches!(c, '-' | '_')).collect();

        [label, hyphenated.as_str(), compact.as_str()]
            .into_iter()
            .find_map(|candidate| Encoding::for_label(candidate.as_bytes()))
            .ok_or_else(|| ConfigValidationError::UnknownEncoding(self.encoding.clone()))
    }

    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigValidationError> {
        if self.delimiter.is_ascii() && !matches!(self.delimiter, '\n' | '\r' | '"') {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigValidationError::InvalidDelimiter(self.delimiter))
        }
    }

    /// Validate the options and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.delimiter_byte()?;
        self.resolve_encoding()?;
        Ok(())
    }
}

/// Configuration for the cleaning pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use disaster_insights::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .missing_threshold(10.0)
///     .save_original(true)
///     .output_dir("snapshots")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How the source file is read.
    pub load: LoadOptions,

    /// Columns whose missing percentage is strictly above this value
    /// (0 - 100) are dropped.
    /// Default: 10.0
    pub missing_threshold: f64,

    /// Whether to remove fully duplicate rows before pruning.
    /// Default: true
    pub remove_duplicates: bool,

    /// Whether to write the deduplicated, unpruned table to disk.
    /// Default: false
    pub save_original: bool,

    /// Whether to write the pruned table to disk. The checkpoint is on by
    /// default; in-memory callers must turn it off explicitly.
    /// Default: true
    pub save_cleaned: bool,

    /// Directory that receives the CSV snapshots.
    /// Default: "."
    pub output_dir: PathBuf,

    /// File name of the unpruned snapshot.
    /// Default: "data_all_columns.csv"
    pub original_name: String,

    /// File name of the pruned snapshot.
    /// Default: "data_columns_cleaned.csv"
    pub cleaned_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            missing_threshold: 10.0,
            remove_duplicates: true,
            save_original: false,
            save_cleaned: true,
            output_dir: PathBuf::from("."),
            original_name: DEFAULT_ORIGINAL_NAME.to_string(),
            cleaned_name: DEFAULT_CLEANED_NAME.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=100.0).contains(&self.missing_threshold) {
            return Err(ConfigValidationError::InvalidThreshold(self.missing_threshold));
        }

        if self.original_name.trim().is_empty() || self.cleaned_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFileName);
        }

        self.load.validate()
    }

    /// Full path of the unpruned snapshot.
    pub fn original_path(&self) -> PathBuf {
        self.output_dir.join(&self.original_name)
    }

    /// Full path of the pruned snapshot.
    pub fn cleaned_path(&self) -> PathBuf {
        self.output_dir.join(&self.cleaned_name)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid missing-value threshold: {0} (must be between 0 and 100)")]
    InvalidThreshold(f64),

    #[error("Unknown text encoding: '{0}'")]
    UnknownEncoding(String),

    #[error("Invalid delimiter: {0:?} (must be a single ASCII character)")]
    InvalidDelimiter(char),

    #[error("Snapshot file names must not be empty")]
    EmptyFileName,
}

impl From<ConfigValidationError> for crate::error::AnalysisError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::AnalysisError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    delimiter: Option<char>,
    encoding: Option<String>,
    header_row: Option<Option<usize>>,
    missing_threshold: Option<f64>,
    remove_duplicates: Option<bool>,
    save_original: Option<bool>,
    save_cleaned: Option<bool>,
    output_dir: Option<PathBuf>,
    original_name: Option<String>,
    cleaned_name: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set the field delimiter of the source file.
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Set the text encoding label of the source file.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the header row index, or `None` for a headerless file.
    pub fn header_row(mut self, header_row: Option<usize>) -> Self {
        self.header_row = Some(header_row);
        self
    }

    /// Replace all load options at once.
    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.delimiter = Some(options.delimiter);
        self.encoding = Some(options.encoding);
        self.header_row = Some(options.header_row);
        self
    }

    /// Set the missing-value percentage threshold for dropping columns.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0 and 100 (e.g., 10.0 = 10%)
    pub fn missing_threshold(mut self, threshold: f64) -> Self {
        self.missing_threshold = Some(threshold);
        self
    }

    /// Enable or disable duplicate row removal.
    pub fn remove_duplicates(mut self, remove: bool) -> Self {
        self.remove_duplicates = Some(remove);
        self
    }

    /// Enable or disable the unpruned snapshot.
    pub fn save_original(mut self, save: bool) -> Self {
        self.save_original = Some(save);
        self
    }

    /// Enable or disable the pruned snapshot.
    pub fn save_cleaned(mut self, save: bool) -> Self {
        self.save_cleaned = Some(save);
        self
    }

    /// Disable both snapshots; results stay in memory.
    pub fn in_memory(self) -> Self {
        self.save_original(false).save_cleaned(false)
    }

    /// Set the directory receiving the snapshots.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the file name of the unpruned snapshot.
    pub fn original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    /// Set the file name of the pruned snapshot.
    pub fn cleaned_name(mut self, name: impl Into<String>) -> Self {
        self.cleaned_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = LoadOptions::default();
        let config = PipelineConfig {
            load: LoadOptions {
                delimiter: self.delimiter.unwrap_or(defaults.delimiter),
                encoding: self.encoding.unwrap_or(defaults.encoding),
                header_row: self.header_row.unwrap_or(defaults.header_row),
            },
            missing_threshold: self.missing_threshold.unwrap_or(10.0),
            remove_duplicates: self.remove_duplicates.unwrap_or(true),
            save_original: self.save_original.unwrap_or(false),
            save_cleaned: self.save_cleaned.unwrap_or(true),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from(".")),
            original_name: self
                .original_name
                .unwrap_or_else(|| DEFAULT_ORIGINAL_NAME.to_string()),
            cleaned_name: self
                .cleaned_name
                .unwrap_or_else(|| DEFAULT_CLEANED_NAME.to_string()),
        };

        config.validate()?;
        Ok(config)
    }
}
