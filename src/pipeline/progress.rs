//! Stage tracking and progress reporting for the analysis pipeline.
//!
//! Stages advance strictly in order; the anomaly and clustering stages are
//! independent of each other but both depend on imputation. Each stage
//! finishes in exactly one of three states: completed, skipped (with the
//! skip reason) or failed (with the error). Skips are ordinary outcomes,
//! never failures.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Stages of the analysis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// Partitioning columns into numeric and non-numeric sets
    Classification,
    /// Filling missing numeric values
    Imputation,
    /// Producing the summary record
    Summarization,
    /// Scoring rows with the isolation ensemble
    AnomalyDetection,
    /// Assigning rows to clusters
    Clustering,
    /// Pipeline completed
    Complete,
    /// Pipeline failed with a run-fatal error
    Failed,
}

impl AnalysisStage {
    /// Human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Classification => "Classifying Columns",
            Self::Imputation => "Imputing Missing Values",
            Self::Summarization => "Summarizing",
            Self::AnomalyDetection => "Detecting Anomalies",
            Self::Clustering => "Assigning Clusters",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Cumulative progress at the start of this stage (0.0 - 1.0).
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Classification => 0.0,
            Self::Imputation => 0.1,
            Self::Summarization => 0.35,
            Self::AnomalyDetection => 0.55,
            Self::Clustering => 0.8,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Terminal state of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Skipped { reason: String },
    Failed { error: String },
}

/// Record of how one stage ended, kept on the run result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: AnalysisStage,
    #[serde(flatten)]
    pub status: StageStatus,
}

impl StageRecord {
    pub fn completed(stage: AnalysisStage) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
        }
    }

    pub fn skipped(stage: AnalysisStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(stage: AnalysisStage, error: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, StageStatus::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, StageStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, StageStatus::Failed { .. })
    }
}

/// Progress update emitted while a run advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: AnalysisStage,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: AnalysisStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            progress: stage.base_progress(),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Complete, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(AnalysisStage::Failed, message)
    }
}

/// Receives progress updates during a run.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Adapter that wraps a closure as a [`ProgressReporter`].
pub struct ClosureProgressReporter<F>(F);

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Arc<Self> {
        Arc::new(Self(callback))
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.0)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stage_display_names() {
        assert_eq!(
            AnalysisStage::AnomalyDetection.display_name(),
            "Detecting Anomalies"
        );
        assert_eq!(AnalysisStage::Complete.display_name(), "Complete");
    }

    #[test]
    fn test_stage_record_predicates() {
        assert!(StageRecord::completed(AnalysisStage::Imputation).is_completed());
        assert!(StageRecord::skipped(AnalysisStage::Clustering, "no numeric columns").is_skipped());
        assert!(StageRecord::failed(AnalysisStage::Clustering, "boom").is_failed());
    }

    #[test]
    fn test_stage_record_serialization() {
        let record = StageRecord::skipped(AnalysisStage::AnomalyDetection, "no numeric columns");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("anomaly_detection"));
        assert!(json.contains("skipped"));
        assert!(json.contains("no numeric columns"));
    }

    #[test]
    fn test_closure_reporter_receives_updates() {
        let seen: Arc<Mutex<Vec<AnalysisStage>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let reporter =
            ClosureProgressReporter::new(move |u| seen_clone.lock().unwrap().push(u.stage));

        reporter.report(ProgressUpdate::new(AnalysisStage::Classification, "start"));
        reporter.report(ProgressUpdate::complete("done"));

        let stages = seen.lock().unwrap();
        assert_eq!(
            *stages,
            vec![AnalysisStage::Classification, AnalysisStage::Complete]
        );
    }

    #[test]
    fn test_progress_monotonic_over_stages() {
        let order = [
            AnalysisStage::Classification,
            AnalysisStage::Imputation,
            AnalysisStage::Summarization,
            AnalysisStage::AnomalyDetection,
            AnalysisStage::Clustering,
            AnalysisStage::Complete,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].base_progress() < pair[1].base_progress());
        }
    }
}
