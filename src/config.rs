//! Configuration types for the analysis pipeline.
//!
//! Every tunable of a run lives in [`RunConfig`], constructed once per run
//! and threaded explicitly through every stage call. There is no ambient
//! configuration: no global seed, no process-wide state, so independent
//! runs can execute concurrently without interfering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Strategy for filling missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImputeStrategy {
    /// Use the arithmetic mean of non-missing values
    #[default]
    Mean,
    /// Use the median of non-missing values
    Median,
}

/// What to do when a numeric column is entirely missing and no fill value
/// can be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EmptyColumnPolicy {
    /// Record the column as skipped and exclude it from the model stages
    #[default]
    Skip,
    /// Abort the whole run
    Abort,
}

/// Which columns the enriched output table retains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ColumnScope {
    /// Keep every input column alongside the appended label columns
    #[default]
    KeepAll,
    /// Narrow the table to its numeric columns before the model stages
    NumericOnly,
}

/// Whether the summary record is produced before or after the table is
/// narrowed to numeric columns (only meaningful with
/// [`ColumnScope::NumericOnly`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SummaryTiming {
    /// Summarize the full table, so dropped columns still appear in the
    /// report's dtype and missing-value listings
    #[default]
    BeforeNarrowing,
    /// Summarize the narrowed table only
    AfterNarrowing,
}

/// Configuration for a single analysis run.
///
/// Use [`RunConfig::builder()`] for a fluent, validated construction.
///
/// # Example
///
/// ```rust,ignore
/// use tabreport::config::RunConfig;
///
/// let config = RunConfig::builder()
///     .contamination(0.1)
///     .clusters(4)
///     .seed(7)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Expected fraction of rows that are anomalies (0.0 - 0.5).
    /// Default: 0.05
    pub contamination: f64,

    /// Number of clusters for the centroid-based partitioning stage.
    /// Default: 3
    pub clusters: usize,

    /// Seed for every random-number source in the run.
    /// Default: 42
    pub seed: u64,

    /// Strategy for filling missing numeric values.
    /// Default: Mean
    pub impute_strategy: ImputeStrategy,

    /// Policy for numeric columns that are entirely missing.
    /// Default: Skip
    pub empty_column_policy: EmptyColumnPolicy,

    /// Which columns the enriched table retains.
    /// Default: KeepAll
    pub column_scope: ColumnScope,

    /// Summary production relative to column narrowing.
    /// Default: BeforeNarrowing
    pub summary_timing: SummaryTiming,

    /// Maximum numeric columns included in distribution/pairwise charts.
    /// Default: 3
    pub max_plot_columns: usize,

    /// Output directory for the report and chart manifest.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Custom base name for the enriched dataset file (without extension).
    /// Default: None (derived from the input file name)
    pub output_name: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            clusters: 3,
            seed: 42,
            impute_strategy: ImputeStrategy::default(),
            empty_column_policy: EmptyColumnPolicy::default(),
            column_scope: ColumnScope::default(),
            summary_timing: SummaryTiming::default(),
            max_plot_columns: 3,
            output_dir: PathBuf::from("output"),
            output_name: None,
        }
    }
}

impl RunConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=0.5).contains(&self.contamination) {
            return Err(ConfigValidationError::InvalidContamination(
                self.contamination,
            ));
        }

        if self.clusters == 0 {
            return Err(ConfigValidationError::InvalidClusterCount(self.clusters));
        }

        if self.max_plot_columns == 0 {
            return Err(ConfigValidationError::InvalidPlotColumns(
                self.max_plot_columns,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid contamination: {0} (must be between 0.0 and 0.5)")]
    InvalidContamination(f64),

    #[error("Invalid cluster count: {0} (must be at least 1)")]
    InvalidClusterCount(usize),

    #[error("Invalid max plot columns: {0} (must be at least 1)")]
    InvalidPlotColumns(usize),
}

/// Builder for [`RunConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    contamination: Option<f64>,
    clusters: Option<usize>,
    seed: Option<u64>,
    impute_strategy: Option<ImputeStrategy>,
    empty_column_policy: Option<EmptyColumnPolicy>,
    column_scope: Option<ColumnScope>,
    summary_timing: Option<SummaryTiming>,
    max_plot_columns: Option<usize>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
}

impl RunConfigBuilder {
    /// Set the expected anomaly fraction used to calibrate the outlier
    /// decision threshold.
    pub fn contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    /// Set the number of clusters for the partitioning stage.
    pub fn clusters(mut self, k: usize) -> Self {
        self.clusters = Some(k);
        self
    }

    /// Set the seed threaded through every random-number source.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the missing-value fill strategy.
    pub fn impute_strategy(mut self, strategy: ImputeStrategy) -> Self {
        self.impute_strategy = Some(strategy);
        self
    }

    /// Set the policy for entirely-missing numeric columns.
    pub fn empty_column_policy(mut self, policy: EmptyColumnPolicy) -> Self {
        self.empty_column_policy = Some(policy);
        self
    }

    /// Set which columns the enriched table retains.
    pub fn column_scope(mut self, scope: ColumnScope) -> Self {
        self.column_scope = Some(scope);
        self
    }

    /// Set when the summary record is produced relative to narrowing.
    pub fn summary_timing(mut self, timing: SummaryTiming) -> Self {
        self.summary_timing = Some(timing);
        self
    }

    /// Set the maximum numeric columns included in chart artifacts.
    pub fn max_plot_columns(mut self, n: usize) -> Self {
        self.max_plot_columns = Some(n);
        self
    }

    /// Set the output directory for generated artifacts.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set a custom base name for the enriched dataset file.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `RunConfig` or an error if validation fails.
    pub fn build(self) -> Result<RunConfig, ConfigValidationError> {
        let config = RunConfig {
            contamination: self.contamination.unwrap_or(0.05),
            clusters: self.clusters.unwrap_or(3),
            seed: self.seed.unwrap_or(42),
            impute_strategy: self.impute_strategy.unwrap_or_default(),
            empty_column_policy: self.empty_column_policy.unwrap_or_default(),
            column_scope: self.column_scope.unwrap_or_default(),
            summary_timing: self.summary_timing.unwrap_or_default(),
            max_plot_columns: self.max_plot_columns.unwrap_or(3),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("output")),
            output_name: self.output_name,
        };

        config.validate()?;
        Ok(config)
    }
}
