//! Core result-record types produced by the analysis pipeline.

use serde::{Deserialize, Serialize};

/// Descriptive statistics for one numeric column.
///
/// The standard deviation is the sample deviation (ddof = 1); percentiles
/// use linear interpolation between closest ranks. All statistics are
/// computed over non-missing values only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Count of non-missing values
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Per-column entry of a [`SummaryRecord`].
///
/// Non-numeric columns carry dtype and missing count only; `stats` is
/// populated for numeric columns with at least one non-missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    /// Runtime dtype label (e.g. "f64", "i64", "str")
    pub dtype: String,
    pub missing_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DescriptiveStats>,
}

/// Immutable snapshot of a table's shape, dtypes, missing values and
/// per-numeric-column descriptive statistics.
///
/// Produced by [`crate::summary::Summarizer::summarize`]; owned by the
/// pipeline for the duration of a run and embedded into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub row_count: usize,
    pub column_count: usize,
    /// One entry per column, in original column order
    pub columns: Vec<ColumnSummary>,
}

impl SummaryRecord {
    /// Look up the summary entry for a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Total missing cells across all columns.
    pub fn missing_total(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }

    /// Names of columns that carry descriptive statistics.
    pub fn described_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.stats.is_some())
            .map(|c| c.name.as_str())
            .collect()
    }
}
