//! Chart planning and the renderer boundary.
//!
//! The pipeline decides *what* to plot; drawing pixels belongs to an
//! external rendering collaborator behind the [`ChartRenderer`] trait.
//! Artifact names are stable so the report can reference them before any
//! rendering happens. The shipped [`ManifestRenderer`] materializes the
//! plan as a JSON chart manifest (including the correlation values for the
//! heatmap) for a plotting collaborator to consume.

use crate::error::{AnalysisError, Result};
use crate::summary::Summarizer;
use crate::types::SummaryRecord;
use chrono::Local;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// One chart artifact the renderer collaborator should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    CorrelationHeatmap { columns: Vec<String> },
    Distribution { column: String },
    PairPlot { columns: Vec<String> },
    OutlierScatter { column: String },
    ClusterScatter { x: String, y: String },
}

impl ChartSpec {
    /// Stable artifact file name referenced by the report.
    pub fn file_name(&self) -> String {
        match self {
            Self::CorrelationHeatmap { .. } => "correlation_heatmap.png".to_string(),
            Self::Distribution { column } => format!("distribution_{}.png", column),
            Self::PairPlot { .. } => "pairplot.png".to_string(),
            Self::OutlierScatter { .. } => "outliers.png".to_string(),
            Self::ClusterScatter { .. } => "clusters.png".to_string(),
        }
    }
}

/// Decides the artifact set for one run.
pub struct ChartPlanner;

impl ChartPlanner {
    /// Plan the chart artifacts.
    ///
    /// With no numeric columns nothing is planned. The outlier scatter is
    /// present only when outlier labels exist; the cluster scatter only
    /// when cluster ids exist and at least two numeric columns do.
    pub fn plan(
        numeric_columns: &[String],
        has_outlier_labels: bool,
        has_cluster_ids: bool,
        max_plot_columns: usize,
    ) -> Vec<ChartSpec> {
        let mut charts = Vec::new();
        if numeric_columns.is_empty() {
            return charts;
        }

        charts.push(ChartSpec::CorrelationHeatmap {
            columns: numeric_columns.to_vec(),
        });

        for column in numeric_columns.iter().take(max_plot_columns) {
            charts.push(ChartSpec::Distribution {
                column: column.clone(),
            });
        }

        if numeric_columns.len() >= 2 {
            charts.push(ChartSpec::PairPlot {
                columns: numeric_columns
                    .iter()
                    .take(max_plot_columns)
                    .cloned()
                    .collect(),
            });
        }

        if has_outlier_labels {
            charts.push(ChartSpec::OutlierScatter {
                column: numeric_columns[0].clone(),
            });
        }

        if has_cluster_ids && numeric_columns.len() >= 2 {
            charts.push(ChartSpec::ClusterScatter {
                x: numeric_columns[0].clone(),
                y: numeric_columns[1].clone(),
            });
        }

        charts
    }
}

/// Rendering collaborator boundary.
///
/// Implementations receive the enriched table, the summary record and the
/// planned charts, and produce the artifact files. Render failures are
/// logged by the caller; the run is still analytically successful.
pub trait ChartRenderer: Send + Sync {
    /// Produce the artifacts under `output_dir`, returning their paths.
    fn render(
        &self,
        table: &DataFrame,
        summary: &SummaryRecord,
        charts: &[ChartSpec],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>>;

    /// Collaborator name for logging.
    fn name(&self) -> &str;
}

/// Default renderer: writes a `charts.json` manifest describing every
/// planned artifact (plus the correlation values the heatmap needs) for an
/// external plotting collaborator.
pub struct ManifestRenderer;

impl ChartRenderer for ManifestRenderer {
    fn render(
        &self,
        table: &DataFrame,
        summary: &SummaryRecord,
        charts: &[ChartSpec],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if charts.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::with_capacity(charts.len());
        for chart in charts {
            let mut entry = json!({
                "file": chart.file_name(),
                "spec": chart,
            });
            if let ChartSpec::CorrelationHeatmap { columns } = chart {
                let matrix = Summarizer::correlation_matrix(table, columns)
                    .map_err(|e| AnalysisError::Render {
                        artifact: chart.file_name(),
                        reason: e.to_string(),
                    })?;
                entry["correlation"] = json!(matrix);
            }
            entries.push(entry);
        }

        let manifest = json!({
            "generated_at": Local::now().to_rfc3339(),
            "rows": summary.row_count,
            "charts": entries,
        });

        std::fs::create_dir_all(output_dir).map_err(|e| AnalysisError::Render {
            artifact: "charts.json".to_string(),
            reason: e.to_string(),
        })?;
        let path = output_dir.join("charts.json");
        std::fs::write(&path, serde_json::to_string_pretty(&manifest)?).map_err(|e| {
            AnalysisError::Render {
                artifact: "charts.json".to_string(),
                reason: e.to_string(),
            }
        })?;

        info!("Chart manifest written to {}", path.display());
        Ok(vec![path])
    }

    fn name(&self) -> &str {
        "manifest"
    }
}
