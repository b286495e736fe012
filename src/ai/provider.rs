//! Narrative provider trait.

use crate::render::ChartSpec;
use crate::types::SummaryRecord;
use anyhow::Result;
use std::fmt::Write as _;

/// Trait for collaborators that turn an analysis digest into a short
/// narrative for the report.
///
/// Implementations must be `Send + Sync`. Errors are surfaced via
/// `anyhow::Result`; the caller falls back to the template report when a
/// provider fails.
pub trait NarrativeProvider: Send + Sync {
    /// Produce a narrative from the digest built by [`analysis_digest`].
    fn narrate(&self, digest: &str) -> Result<String>;

    /// Provider name for logging and debugging.
    fn name(&self) -> &str;

    /// Model identifier, if the provider exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Compact plain-text digest of a run, suitable as prompt context.
pub fn analysis_digest(summary: &SummaryRecord, charts: &[ChartSpec]) -> String {
    let mut digest = String::new();
    let _ = writeln!(
        digest,
        "Dataset: {} rows, {} columns.",
        summary.row_count, summary.column_count
    );

    for column in &summary.columns {
        match &column.stats {
            Some(stats) => {
                let _ = writeln!(
                    digest,
                    "Column {} ({}): {} missing, mean {:.4}, std {:.4}, min {:.4}, max {:.4}.",
                    column.name,
                    column.dtype,
                    column.missing_count,
                    stats.mean,
                    stats.std,
                    stats.min,
                    stats.max
                );
            }
            None => {
                let _ = writeln!(
                    digest,
                    "Column {} ({}): {} missing.",
                    column.name, column.dtype, column.missing_count
                );
            }
        }
    }

    if !charts.is_empty() {
        let files: Vec<String> = charts.iter().map(|c| c.file_name()).collect();
        let _ = writeln!(digest, "Chart artifacts: {}.", files.join(", "));
    }

    digest
}
