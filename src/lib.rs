//! Automated Exploratory Analysis Library
//!
//! Turns a delimited tabular file into an enriched dataset and a
//! structured report: summary statistics, missing-value accounting,
//! anomaly flags, cluster assignments, a chart plan and a narrative
//! Markdown document referencing the chart artifacts.
//!
//! # Overview
//!
//! The core is a single configurable pipeline:
//!
//! - **Classification**: partition columns into numeric and non-numeric sets
//! - **Imputation**: fill missing numeric values with a per-column statistic
//! - **Summarization**: shape, dtypes, missing counts, descriptive statistics
//! - **Anomaly detection**: isolation-forest labels over the numeric sub-table
//! - **Clustering**: k-means cluster ids over the same sub-table
//!
//! Everything a run needs (contamination, cluster count, seed, imputation
//! strategy) lives in one [`RunConfig`] threaded explicitly through every
//! stage, so independent runs never share mutable state and identical
//! inputs produce identical label sequences.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tabreport::{ManifestRenderer, Pipeline, ReportWriter, RunConfig, TableLoader};
//! use tabreport::render::ChartRenderer;
//! use std::path::Path;
//!
//! let df = TableLoader::load(Path::new("data.csv"))?;
//!
//! let result = Pipeline::builder()
//!     .config(RunConfig::builder().contamination(0.05).clusters(3).seed(42).build()?)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! ManifestRenderer.render(&result.table, &result.summary, &result.charts, Path::new("output"))?;
//! let report = ReportWriter::build("data.csv", &result.summary, &result.charts, None);
//! ReportWriter::new("output").write(&report)?;
//! ```
//!
//! # Skips versus failures
//!
//! A table with no numeric columns is not an error: the model stages are
//! recorded as skipped, no label columns are appended and the report
//! omits the corresponding sections. Hard errors behave per stage: a
//! failed clustering stage does not block anomaly detection. Load
//! failures and (under the abort policy) an entirely-missing numeric
//! column end the run with nothing written.
//!
//! # Narrative boundary
//!
//! With the `ai` feature (default), [`ai::OpenAiProvider`] can turn a run
//! digest into the report's narrative section via any OpenAI-compatible
//! chat-completions endpoint. See the [`ai`] module for the provider
//! trait.

pub mod ai;
pub mod anomaly;
pub mod classifier;
pub mod cluster;
pub mod config;
pub mod error;
pub mod imputer;
pub mod loader;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use anomaly::{AnomalyDetector, IsolationForest, OutlierLabel};
pub use classifier::ColumnClassifier;
pub use cluster::{ClusterAssigner, KMeans};
pub use config::{
    ColumnScope, ConfigValidationError, EmptyColumnPolicy, ImputeStrategy, RunConfig,
    RunConfigBuilder, SummaryTiming,
};
pub use error::{AnalysisError, ResultExt};
pub use imputer::{ImputationOutcome, ImputedColumn, MissingValueImputer};
pub use loader::TableLoader;
pub use pipeline::{
    AnalysisResult, AnalysisStage, ClosureProgressReporter, Pipeline, PipelineBuilder,
    ProgressReporter, ProgressUpdate, StageRecord, StageStatus,
};
pub use render::{ChartPlanner, ChartRenderer, ChartSpec, ManifestRenderer};
pub use report::ReportWriter;
pub use summary::Summarizer;
pub use types::{ColumnSummary, DescriptiveStats, SummaryRecord};
