use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Aggregate keys and tables
// ============================================================================

/// A categorical cell value used as the key of aggregate tables.
///
/// Ordering places every integer (ascending) before every text value
/// (lexicographic), with the missing bucket last.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Int(i64),
    Text(String),
    Missing,
}

impl Category {
    pub fn text(value: impl Into<String>) -> Self {
        Category::Text(value.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Category::Missing)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Int(n) => write!(f, "{}", n),
            Category::Text(s) => write!(f, "{}", s),
            Category::Missing => write!(f, "(missing)"),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::Text(value.to_string())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::Text(value)
    }
}

impl From<i64> for Category {
    fn from(value: i64) -> Self {
        Category::Int(value)
    }
}

/// One row of a [`FrequencyTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: Category,
    pub count: usize,
}

/// Occurrence count per distinct value.
///
/// Entries are kept most frequent first, ties broken by ascending value.
/// Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub column: String,
    pub entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    /// Build a table from raw counts.
    pub fn from_counts(column: impl Into<String>, counts: HashMap<Category, usize>) -> Self {
        let mut entries: Vec<FrequencyEntry> = counts
            .into_iter()
            .map(|(value, count)| FrequencyEntry { value, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        Self {
            column: column.into(),
            entries,
        }
    }

    pub fn empty(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for a value, or `None` if it never occurs.
    pub fn get(&self, value: &Category) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| &e.value == value)
            .map(|e| e.count)
    }

    /// Convenience lookup for text categories.
    pub fn count_of(&self, value: &str) -> usize {
        self.get(&Category::text(value)).unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, usize)> {
        self.entries.iter().map(|e| (&e.value, e.count))
    }

    /// The `n` most frequent values.
    pub fn top(&self, n: usize) -> FrequencyTable {
        FrequencyTable {
            column: self.column.clone(),
            entries: self.entries.iter().take(n).cloned().collect(),
        }
    }

    /// The table without its missing-value bucket.
    pub fn without_missing(&self) -> FrequencyTable {
        FrequencyTable {
            column: self.column.clone(),
            entries: self
                .entries
                .iter()
                .filter(|e| !e.value.is_missing())
                .cloned()
                .collect(),
        }
    }

    /// Percentage of the total held by each value, in table order.
    pub fn shares(&self) -> Vec<(Category, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        self.entries
            .iter()
            .map(|e| (e.value.clone(), e.count as f64 / total as f64 * 100.0))
            .collect()
    }
}

/// Counts of co-occurring values of two columns.
///
/// Row keys are the integer-coerced values of the row column, column keys
/// the values of the column column (missing included). Both axes ascend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTab {
    pub row_column: String,
    pub column_column: String,
    pub row_keys: Vec<i64>,
    pub column_keys: Vec<Category>,
    /// `counts[r][c]` pairs `row_keys[r]` with `column_keys[c]`.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn get(&self, row: i64, column: &Category) -> usize {
        let Ok(r) = self.row_keys.binary_search(&row) else {
            return 0;
        };
        let Ok(c) = self.column_keys.binary_search(column) else {
            return 0;
        };
        self.counts[r][c]
    }

    /// Sum over all cells.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn row_totals(&self) -> Vec<(i64, usize)> {
        self.row_keys
            .iter()
            .zip(&self.counts)
            .map(|(key, row)| (*key, row.iter().sum()))
            .collect()
    }

    pub fn column_totals(&self) -> Vec<(Category, usize)> {
        self.column_keys
            .iter()
            .enumerate()
            .map(|(c, key)| (key.clone(), self.counts.iter().map(|row| row[c]).sum()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }
}

/// One point of a [`TimeCounts`] series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCount {
    pub time: Category,
    pub count: usize,
}

/// Row counts per distinct time value, ascending by time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeCounts {
    pub column: String,
    pub points: Vec<TimeCount>,
}

impl TimeCounts {
    pub fn total(&self) -> usize {
        self.points.iter().map(|p| p.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, usize)> {
        self.points.iter().map(|p| (&p.time, p.count))
    }

    /// The time value with the highest count (earliest on ties).
    pub fn peak(&self) -> Option<&TimeCount> {
        self.points
            .iter()
            .fold(None, |best: Option<&TimeCount>, p| match best {
                Some(b) if b.count >= p.count => Some(b),
                _ => Some(p),
            })
    }
}

// ============================================================================
// Cleaning summary types
// ============================================================================

/// Missing-value statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub name: String,
    pub missing_count: usize,
    /// `missing_count / rows * 100`; 0 for an empty table.
    pub missing_percentage: f64,
}

/// Human-readable summary of what the pipeline did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_loaded: usize,
    pub columns_loaded: usize,
    pub duplicates_removed: usize,

    /// Rows after cleaning. Equal to `rows_loaded - duplicates_removed`.
    pub rows_after: usize,
    pub columns_after: usize,

    /// Threshold the pruner applied (percent).
    pub missing_threshold: f64,
    /// Columns dropped by the pruner, in source order.
    pub dropped_columns: Vec<String>,
    /// Missing statistics computed before pruning.
    pub missing_report: Vec<ColumnMissing>,

    /// Snapshot of the unpruned table, if written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_snapshot: Option<PathBuf>,
    /// Snapshot of the pruned table, if written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_snapshot: Option<PathBuf>,

    pub warnings: Vec<String>,
}

impl CleaningSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn columns_dropped(&self) -> usize {
        self.dropped_columns.len()
    }

    /// Percentage of loaded rows removed as duplicates.
    pub fn duplicate_percentage(&self) -> f64 {
        if self.rows_loaded == 0 {
            0.0
        } else {
            self.duplicates_removed as f64 / self.rows_loaded as f64 * 100.0
        }
    }
}
