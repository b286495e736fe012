//! The pipeline orchestrator.
//!
//! Sequences classification, imputation, summarization, anomaly detection
//! and clustering over one table, owns the enriched table and the summary
//! record for the duration of the run, and returns both together with the
//! chart plan and per-stage records.
//!
//! Failure policy: `LoadError` never reaches the pipeline (the loader runs
//! before it) and an `ImputationError` under the abort policy is
//! run-fatal. A hard error in one of the two independent model stages is
//! recorded on that stage only; the sibling stage still runs and the run
//! still completes, with the affected label column and charts omitted.

use crate::anomaly::AnomalyDetector;
use crate::classifier::ColumnClassifier;
use crate::cluster::ClusterAssigner;
use crate::config::{ColumnScope, RunConfig, SummaryTiming};
use crate::error::{AnalysisError, Result};
use crate::imputer::MissingValueImputer;
use crate::pipeline::progress::{
    AnalysisStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate, StageRecord,
};
use crate::render::{ChartPlanner, ChartSpec};
use crate::summary::Summarizer;
use crate::types::SummaryRecord;
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Successful output of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// The enriched table: the input plus `outlier`/`cluster` columns for
    /// each model stage that ran
    pub table: DataFrame,
    pub summary: SummaryRecord,
    /// Chart artifacts the renderer collaborator should produce
    pub charts: Vec<ChartSpec>,
    /// How each stage ended
    pub stages: Vec<StageRecord>,
    pub duration_ms: u64,
}

impl AnalysisResult {
    /// The record for a given stage, if it was reached.
    pub fn stage(&self, stage: AnalysisStage) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.stage == stage)
    }

    /// Whether a stage ran to completion.
    pub fn stage_completed(&self, stage: AnalysisStage) -> bool {
        self.stage(stage).is_some_and(StageRecord::is_completed)
    }
}

/// The analysis pipeline.
///
/// Use [`Pipeline::builder()`] to construct one with custom configuration
/// and an optional progress callback, then feed it a loaded table:
///
/// ```rust,ignore
/// use tabreport::{Pipeline, RunConfig};
///
/// let result = Pipeline::builder()
///     .config(RunConfig::builder().clusters(4).build()?)
///     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
///     .build()?
///     .process(df)?;
/// ```
pub struct Pipeline {
    config: RunConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Create a pipeline from a configuration, without progress reporting.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            progress_reporter: None,
        }
    }

    /// Run the full analysis over a loaded table.
    pub fn process(&self, df: DataFrame) -> Result<AnalysisResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Analysis complete"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline failed [{}]: {}", e.error_code(), e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn report_stage(&self, stage: AnalysisStage) {
        self.report_progress(ProgressUpdate::new(stage, stage.display_name()));
    }

    fn process_internal(&self, mut df: DataFrame) -> Result<AnalysisResult> {
        let start = Instant::now();
        let mut stages: Vec<StageRecord> = Vec::new();

        // Classification
        self.report_stage(AnalysisStage::Classification);
        let numeric = ColumnClassifier::classify(&df);
        info!(
            "Classified {} of {} columns as numeric",
            numeric.len(),
            df.width()
        );
        stages.push(StageRecord::completed(AnalysisStage::Classification));

        // Imputation: run-fatal under the abort policy
        self.report_stage(AnalysisStage::Imputation);
        let mut model_columns = numeric.clone();
        if numeric.is_empty() {
            info!("No numeric columns, skipping imputation");
            stages.push(StageRecord::skipped(
                AnalysisStage::Imputation,
                "no numeric columns",
            ));
        } else {
            match MissingValueImputer::impute(
                &mut df,
                &numeric,
                self.config.impute_strategy,
                self.config.empty_column_policy,
            ) {
                Ok(outcome) => {
                    model_columns.retain(|c| !outcome.skipped.contains(c));
                    stages.push(StageRecord::completed(AnalysisStage::Imputation));
                }
                Err(e) => {
                    stages.push(StageRecord::failed(AnalysisStage::Imputation, e.to_string()));
                    return Err(e);
                }
            }
        }

        // Summarization, interleaved with optional column narrowing
        self.report_stage(AnalysisStage::Summarization);
        let summary = match (self.config.column_scope, self.config.summary_timing) {
            (ColumnScope::NumericOnly, SummaryTiming::BeforeNarrowing) => {
                let summary = Summarizer::summarize(&df)?;
                df = Self::narrow_to_columns(df, &numeric)?;
                summary
            }
            (ColumnScope::NumericOnly, SummaryTiming::AfterNarrowing) => {
                df = Self::narrow_to_columns(df, &numeric)?;
                Summarizer::summarize(&df)?
            }
            (ColumnScope::KeepAll, _) => Summarizer::summarize(&df)?,
        };
        stages.push(StageRecord::completed(AnalysisStage::Summarization));

        // Anomaly detection: independent of clustering, failures are
        // stage-local
        self.report_stage(AnalysisStage::AnomalyDetection);
        let mut has_outlier_labels = false;
        match AnomalyDetector::detect(&df, &model_columns, &self.config) {
            Ok(Some(labels)) => {
                let values: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
                df.with_column(Series::new("outlier".into(), values))?;
                has_outlier_labels = true;
                stages.push(StageRecord::completed(AnalysisStage::AnomalyDetection));
            }
            Ok(None) => {
                stages.push(StageRecord::skipped(
                    AnalysisStage::AnomalyDetection,
                    "no numeric columns",
                ));
            }
            Err(e) => {
                warn!("Anomaly detection failed [{}]: {}", e.error_code(), e);
                stages.push(StageRecord::failed(
                    AnalysisStage::AnomalyDetection,
                    e.to_string(),
                ));
            }
        }

        // Clustering: independent of anomaly detection
        self.report_stage(AnalysisStage::Clustering);
        let mut has_cluster_ids = false;
        match ClusterAssigner::assign(&df, &model_columns, &self.config) {
            Ok(Some(ids)) => {
                df.with_column(Series::new("cluster".into(), ids))?;
                has_cluster_ids = true;
                stages.push(StageRecord::completed(AnalysisStage::Clustering));
            }
            Ok(None) => {
                stages.push(StageRecord::skipped(
                    AnalysisStage::Clustering,
                    "no numeric columns",
                ));
            }
            Err(e) => {
                warn!("Clustering failed [{}]: {}", e.error_code(), e);
                stages.push(StageRecord::failed(AnalysisStage::Clustering, e.to_string()));
            }
        }

        let charts = ChartPlanner::plan(
            &model_columns,
            has_outlier_labels,
            has_cluster_ids,
            self.config.max_plot_columns,
        );

        Ok(AnalysisResult {
            table: df,
            summary,
            charts,
            stages,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn narrow_to_columns(df: DataFrame, columns: &[String]) -> Result<DataFrame> {
        let names: Vec<PlSmallStr> = columns.iter().map(|c| c.as_str().into()).collect();
        Ok(df.select(names)?)
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<RunConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the run configuration.
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a progress callback.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(ClosureProgressReporter::new(callback));
        self
    }

    /// Register a progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptyColumnPolicy;
    use std::collections::HashSet;

    /// 100 rows in three well-separated blobs over three numeric columns.
    fn blob_frame() -> DataFrame {
        let mut a = Vec::with_capacity(100);
        let mut b = Vec::with_capacity(100);
        let mut c = Vec::with_capacity(100);
        for i in 0..100 {
            let center = match i % 3 {
                0 => 0.0,
                1 => 50.0,
                _ => 100.0,
            };
            let jitter = (i / 3) as f64 * 0.05;
            a.push(center + jitter);
            b.push(center * 0.5 + jitter);
            c.push(center * 2.0 - jitter);
        }
        df!["a" => a, "b" => b, "c" => c].unwrap()
    }

    #[test]
    fn test_end_to_end_enrichment() {
        let result = Pipeline::new(RunConfig::default())
            .process(blob_frame())
            .unwrap();

        // 3 original columns + outlier + cluster
        assert_eq!(result.table.shape(), (100, 5));
        assert!(result.table.column("outlier").is_ok());
        assert!(result.table.column("cluster").is_ok());

        // Roughly 5% contamination
        let outlier = result.table.column("outlier").unwrap();
        let flagged = outlier
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .filter(|v| *v == Some("outlier"))
            .count();
        assert!(flagged <= 10, "flagged {} rows", flagged);

        // Cluster ids in [0, 2] with all three present
        let cluster = result.table.column("cluster").unwrap();
        let ids: HashSet<u32> = cluster
            .as_materialized_series()
            .u32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ids, HashSet::from([0, 1, 2]));

        assert!(result.stage_completed(AnalysisStage::AnomalyDetection));
        assert!(result.stage_completed(AnalysisStage::Clustering));
        assert_eq!(result.charts.len(), 5);
    }

    #[test]
    fn test_zero_numeric_columns_skips_model_stages() {
        let df = df![
            "name" => ["a", "b", "c"],
            "city" => ["x", "y", "z"],
        ]
        .unwrap();

        let result = Pipeline::new(RunConfig::default())
            .process(df.clone())
            .unwrap();

        // The enriched table equals the input table
        assert!(result.table.equals(&df));
        assert!(result.stage(AnalysisStage::Imputation).unwrap().is_skipped());
        assert!(
            result
                .stage(AnalysisStage::AnomalyDetection)
                .unwrap()
                .is_skipped()
        );
        assert!(result.stage(AnalysisStage::Clustering).unwrap().is_skipped());
        assert!(result.charts.is_empty());
    }

    #[test]
    fn test_imputed_value_matches_pre_imputation_mean() {
        let raw = [
            Some(12.0),
            Some(15.5),
            None,
            Some(9.25),
            Some(30.0),
            Some(18.75),
            Some(22.0),
            Some(11.5),
            Some(27.25),
            Some(16.0),
        ];
        let known: Vec<f64> = raw.iter().flatten().copied().collect();
        let expected_mean = known.iter().sum::<f64>() / known.len() as f64;

        let df = df!["v" => raw.to_vec()].unwrap();
        let result = Pipeline::new(RunConfig::default()).process(df).unwrap();

        // Missing count is zero after imputation
        assert_eq!(result.summary.column("v").unwrap().missing_count, 0);

        let filled = result
            .table
            .column("v")
            .unwrap()
            .get(2)
            .unwrap()
            .try_extract::<f64>()
            .unwrap();
        // Equal to the pre-imputation mean to 6 significant digits
        assert!((filled - expected_mean).abs() < expected_mean.abs() * 1e-6);
    }

    #[test]
    fn test_empty_column_abort_policy_is_run_fatal() {
        let df = df![
            "empty" => [Option::<f64>::None, None, None],
        ]
        .unwrap();

        let config = RunConfig::builder()
            .empty_column_policy(EmptyColumnPolicy::Abort)
            .build()
            .unwrap();

        let err = Pipeline::new(config).process(df).unwrap_err();
        assert_eq!(err.error_code(), "IMPUTATION_ERROR");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_empty_column_skip_policy_excludes_column_from_models() {
        let mut a = vec![Some(1.0)];
        for i in 1..12 {
            a.push(Some(i as f64));
        }
        let df = df![
            "empty" => vec![Option::<f64>::None; 12],
            "a" => a,
        ]
        .unwrap();

        let result = Pipeline::new(RunConfig::default()).process(df).unwrap();

        // The model stages ran on the remaining numeric column
        assert!(result.stage_completed(AnalysisStage::AnomalyDetection));
        assert!(result.stage_completed(AnalysisStage::Clustering));
        // The skipped column keeps its missing values and stays in the summary
        assert_eq!(result.summary.column("empty").unwrap().missing_count, 12);
        assert_eq!(result.table.column("empty").unwrap().null_count(), 12);
    }

    #[test]
    fn test_cluster_failure_is_stage_local() {
        // Two rows cannot form three clusters; anomaly detection is
        // unaffected
        let df = df!["v" => [1.0, 2.0]].unwrap();

        let result = Pipeline::new(RunConfig::default()).process(df).unwrap();

        assert!(result.stage_completed(AnalysisStage::AnomalyDetection));
        assert!(result.stage(AnalysisStage::Clustering).unwrap().is_failed());
        assert!(result.table.column("outlier").is_ok());
        assert!(result.table.column("cluster").is_err());
        // No cluster chart is planned for a failed stage
        assert!(
            !result
                .charts
                .iter()
                .any(|c| matches!(c, ChartSpec::ClusterScatter { .. }))
        );
    }

    #[test]
    fn test_numeric_only_scope_narrows_table() {
        let df = df![
            "v" => [1.0, 2.0, 3.0, 4.0],
            "label" => ["a", "b", "c", "d"],
        ]
        .unwrap();

        let config = RunConfig::builder()
            .column_scope(ColumnScope::NumericOnly)
            .build()
            .unwrap();

        let result = Pipeline::new(config).process(df).unwrap();

        assert!(result.table.column("label").is_err());
        // Summarized before narrowing by default, so the dropped column
        // still appears in the record
        assert!(result.summary.column("label").is_some());
    }

    #[test]
    fn test_summary_after_narrowing_omits_dropped_columns() {
        let df = df![
            "v" => [1.0, 2.0, 3.0, 4.0],
            "label" => ["a", "b", "c", "d"],
        ]
        .unwrap();

        let config = RunConfig::builder()
            .column_scope(ColumnScope::NumericOnly)
            .summary_timing(SummaryTiming::AfterNarrowing)
            .build()
            .unwrap();

        let result = Pipeline::new(config).process(df).unwrap();
        assert!(result.summary.column("label").is_none());
    }

    #[test]
    fn test_determinism_across_runs() {
        let config = RunConfig::default();
        let first = Pipeline::new(config.clone()).process(blob_frame()).unwrap();
        let second = Pipeline::new(config).process(blob_frame()).unwrap();

        assert!(first.table.equals(&second.table));
        assert_eq!(first.summary, second.summary);
    }

    #[test]
    fn test_progress_reporting_reaches_complete() {
        use std::sync::{Arc, Mutex};

        let seen: Arc<Mutex<Vec<AnalysisStage>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |u| seen_clone.lock().unwrap().push(u.stage))
            .build()
            .unwrap();

        pipeline.process(blob_frame()).unwrap();

        let stages = seen.lock().unwrap();
        assert_eq!(stages.first(), Some(&AnalysisStage::Classification));
        assert_eq!(stages.last(), Some(&AnalysisStage::Complete));
    }
}
