//! Markdown report generation.
//!
//! Emits a single narrative document embedding the summary record and the
//! chart references in a fixed order: overview, column/dtype listing,
//! summary statistics per numeric column, missing-value counts, then image
//! references. Artifacts for skipped stages are simply absent rather than
//! referenced and broken.

use crate::error::{AnalysisError, Result};
use crate::render::ChartSpec;
use crate::types::SummaryRecord;
use chrono::Local;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the analysis report document.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build the report document.
    pub fn build(
        source: &str,
        summary: &SummaryRecord,
        charts: &[ChartSpec],
        narrative: Option<&str>,
    ) -> String {
        let mut doc = String::new();

        doc.push_str("# Automated Data Analysis Report\n\n");
        let _ = writeln!(doc, "_Generated {}_\n", Local::now().format("%Y-%m-%d %H:%M"));

        // Overview and dtype listing
        doc.push_str("## Data Overview\n\n");
        let _ = writeln!(doc, "- Source: `{}`", source);
        let _ = writeln!(doc, "- Number of rows: {}", summary.row_count);
        let _ = writeln!(doc, "- Number of columns: {}", summary.column_count);
        doc.push_str("- Column names and data types:\n\n");
        for column in &summary.columns {
            let _ = writeln!(doc, "  - {}: {}", column.name, column.dtype);
        }

        // Summary statistics per numeric column
        doc.push_str("\n## Summary Statistics\n\n");
        let described: Vec<_> = summary
            .columns
            .iter()
            .filter_map(|c| c.stats.as_ref().map(|stats| (c, stats)))
            .collect();
        if described.is_empty() {
            doc.push_str("No numeric columns to describe.\n");
        }
        for (column, stats) in described {
            let _ = writeln!(doc, "### {}\n", column.name);
            let _ = writeln!(doc, "- count: {}", stats.count);
            let _ = writeln!(doc, "- mean: {:.4}", stats.mean);
            let _ = writeln!(doc, "- std: {:.4}", stats.std);
            let _ = writeln!(doc, "- min: {:.4}", stats.min);
            let _ = writeln!(doc, "- 25%: {:.4}", stats.q25);
            let _ = writeln!(doc, "- 50%: {:.4}", stats.median);
            let _ = writeln!(doc, "- 75%: {:.4}", stats.q75);
            let _ = writeln!(doc, "- max: {:.4}\n", stats.max);
        }

        // Missing values
        doc.push_str("\n## Missing Values\n\n");
        for column in &summary.columns {
            let _ = writeln!(
                doc,
                "- {}: {} missing values",
                column.name, column.missing_count
            );
        }

        // Image references, in planned order
        if !charts.is_empty() {
            doc.push_str("\n## Visualizations\n\n");
            for chart in charts {
                let _ = writeln!(doc, "![]({})\n", chart.file_name());
            }
        }

        if let Some(narrative) = narrative {
            doc.push_str("\n## Narrative Insights\n\n");
            doc.push_str(narrative.trim());
            doc.push('\n');
        }

        doc
    }

    /// Write the document as `README.md` under the output directory.
    pub fn write(&self, document: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| AnalysisError::Report(e.to_string()))?;
        let path = self.output_dir.join("README.md");
        std::fs::write(&path, document).map_err(|e| AnalysisError::Report(e.to_string()))?;
        info!("Report written to {}", path.display());
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnSummary, DescriptiveStats};

    fn sample_summary() -> SummaryRecord {
        SummaryRecord {
            row_count: 4,
            column_count: 2,
            columns: vec![
                ColumnSummary {
                    name: "price".to_string(),
                    dtype: "f64".to_string(),
                    missing_count: 1,
                    stats: Some(DescriptiveStats {
                        count: 3,
                        mean: 10.0,
                        std: 2.0,
                        min: 8.0,
                        q25: 9.0,
                        median: 10.0,
                        q75: 11.0,
                        max: 12.0,
                    }),
                },
                ColumnSummary {
                    name: "city".to_string(),
                    dtype: "str".to_string(),
                    missing_count: 0,
                    stats: None,
                },
            ],
        }
    }

    fn sample_charts() -> Vec<ChartSpec> {
        vec![
            ChartSpec::CorrelationHeatmap {
                columns: vec!["price".to_string()],
            },
            ChartSpec::Distribution {
                column: "price".to_string(),
            },
        ]
    }

    #[test]
    fn test_report_section_order() {
        let doc = ReportWriter::build("data.csv", &sample_summary(), &sample_charts(), None);

        let overview = doc.find("## Data Overview").unwrap();
        let stats = doc.find("## Summary Statistics").unwrap();
        let missing = doc.find("## Missing Values").unwrap();
        let charts = doc.find("## Visualizations").unwrap();

        assert!(overview < stats);
        assert!(stats < missing);
        assert!(missing < charts);
    }

    #[test]
    fn test_report_contains_dtypes_and_stats() {
        let doc = ReportWriter::build("data.csv", &sample_summary(), &sample_charts(), None);

        assert!(doc.contains("- price: f64"));
        assert!(doc.contains("- city: str"));
        assert!(doc.contains("### price"));
        assert!(doc.contains("- mean: 10.0000"));
        // Text columns get no statistics block
        assert!(!doc.contains("### city"));
    }

    #[test]
    fn test_report_missing_value_counts() {
        let doc = ReportWriter::build("data.csv", &sample_summary(), &sample_charts(), None);
        assert!(doc.contains("- price: 1 missing values"));
        assert!(doc.contains("- city: 0 missing values"));
    }

    #[test]
    fn test_report_references_planned_charts_only() {
        let doc = ReportWriter::build("data.csv", &sample_summary(), &sample_charts(), None);
        assert!(doc.contains("![](correlation_heatmap.png)"));
        assert!(doc.contains("![](distribution_price.png)"));
        assert!(!doc.contains("clusters.png"));
    }

    #[test]
    fn test_report_omits_visualizations_section_when_no_charts() {
        let doc = ReportWriter::build("data.csv", &sample_summary(), &[], None);
        assert!(!doc.contains("## Visualizations"));
    }

    #[test]
    fn test_report_embeds_narrative() {
        let doc = ReportWriter::build(
            "data.csv",
            &sample_summary(),
            &[],
            Some("The price column trends upward."),
        );
        assert!(doc.contains("## Narrative Insights"));
        assert!(doc.contains("trends upward"));
    }

    #[test]
    fn test_write_creates_readme() {
        let dir = std::env::temp_dir().join(format!("tabreport_report_{}", std::process::id()));
        let writer = ReportWriter::new(&dir);
        let path = writer.write("# Report\n").unwrap();

        assert!(path.ends_with("README.md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
        std::fs::remove_dir_all(dir).ok();
    }
}
