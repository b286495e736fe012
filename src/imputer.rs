//! Missing-value imputation for numeric columns.
//!
//! Fills each numeric column's missing cells with a per-column statistic
//! (mean by default), mutating the table in place. An entirely missing
//! column has no defined fill value; that is a signaled failure rather
//! than a silent substitution, resolved by the configured
//! [`EmptyColumnPolicy`]. Re-running on an already-imputed table is a
//! no-op.

use crate::config::{EmptyColumnPolicy, ImputeStrategy};
use crate::error::{AnalysisError, Result};
use polars::prelude::*;
use tracing::{debug, warn};

/// Record of one column filled during imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedColumn {
    pub column: String,
    /// Number of cells that were filled
    pub filled: usize,
    /// The substitute value
    pub value: f64,
}

/// What the imputation pass did.
#[derive(Debug, Clone, Default)]
pub struct ImputationOutcome {
    pub imputed: Vec<ImputedColumn>,
    /// Entirely-missing columns excluded under [`EmptyColumnPolicy::Skip`];
    /// the orchestrator removes these from the model-stage column set.
    pub skipped: Vec<String>,
}

/// Fills missing numeric values using a per-column statistic.
pub struct MissingValueImputer;

impl MissingValueImputer {
    /// Impute missing values in `numeric_columns`, mutating `df` in place.
    ///
    /// Non-numeric columns are untouched. Columns without missing values
    /// are left as-is, which also makes a second pass a no-op.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Imputation`] naming the column when a column is
    /// entirely missing and the policy is [`EmptyColumnPolicy::Abort`].
    pub fn impute(
        df: &mut DataFrame,
        numeric_columns: &[String],
        strategy: ImputeStrategy,
        policy: EmptyColumnPolicy,
    ) -> Result<ImputationOutcome> {
        let mut outcome = ImputationOutcome::default();

        for name in numeric_columns {
            let series = df.column(name.as_str())?.as_materialized_series().clone();
            let missing = series.null_count();
            if missing == 0 {
                continue;
            }

            let fill_value = match strategy {
                ImputeStrategy::Mean => series.mean(),
                ImputeStrategy::Median => series.median(),
            };

            let Some(fill_value) = fill_value else {
                match policy {
                    EmptyColumnPolicy::Abort => {
                        return Err(AnalysisError::Imputation {
                            column: name.clone(),
                        });
                    }
                    EmptyColumnPolicy::Skip => {
                        warn!(
                            "Column '{}' is entirely missing, excluding it from model stages",
                            name
                        );
                        outcome.skipped.push(name.clone());
                        continue;
                    }
                }
            };

            Self::fill_with_value(df, name, fill_value, &series)?;
            debug!(
                "Filled {} missing values in '{}' with {:?} {:.4}",
                missing, name, strategy, fill_value
            );
            outcome.imputed.push(ImputedColumn {
                column: name.clone(),
                filled: missing,
                value: fill_value,
            });
        }

        Ok(outcome)
    }

    /// Replace missing cells of a numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
    ) -> Result<()> {
        let mask = series.is_null();
        let mut result_vec = Vec::with_capacity(series.len());

        for i in 0..series.len() {
            if mask.get(i).unwrap_or(false) {
                result_vec.push(Some(fill_value));
            } else {
                let val = series.get(i)?;
                result_vec.push(Some(val.try_extract::<f64>()?));
            }
        }

        let result = Series::new(col_name.into(), result_vec);
        df.replace(col_name, result)?;
        Ok(())
    }
}
