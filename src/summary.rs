//! Descriptive summarization of a table.
//!
//! [`Summarizer::summarize`] is a pure function of the current table
//! state: shape, per-column dtype labels and missing counts, and
//! descriptive statistics for numeric columns. The standard deviation is
//! the sample deviation (ddof = 1); percentiles use linear interpolation.

use crate::error::{Result, ResultExt};
use crate::types::{ColumnSummary, DescriptiveStats, SummaryRecord};
use crate::utils::{dtype_label, is_numeric_dtype, non_null_f64, quantile_linear};
use polars::prelude::*;

/// Computes shape, dtype, missing-value and descriptive-statistic records.
pub struct Summarizer;

impl Summarizer {
    /// Summarize the current state of the table.
    ///
    /// Deterministic and side-effect-free: calling it twice on an
    /// unmutated table yields identical records.
    pub fn summarize(df: &DataFrame) -> Result<SummaryRecord> {
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let stats = if is_numeric_dtype(series.dtype()) {
                Self::describe(series)?
            } else {
                None
            };

            columns.push(ColumnSummary {
                name: series.name().to_string(),
                dtype: dtype_label(series.dtype()),
                missing_count: series.null_count(),
                stats,
            });
        }

        Ok(SummaryRecord {
            row_count: df.height(),
            column_count: df.width(),
            columns,
        })
    }

    /// Descriptive statistics over the non-missing values of a numeric
    /// series. An entirely missing column has no statistics.
    fn describe(series: &Series) -> Result<Option<DescriptiveStats>> {
        let mut values = non_null_f64(series)?;
        if values.is_empty() {
            return Ok(None);
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = Self::sample_std(&values, mean);

        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Ok(Some(DescriptiveStats {
            count,
            mean,
            std,
            min: values[0],
            q25: quantile_linear(&values, 0.25),
            median: quantile_linear(&values, 0.5),
            q75: quantile_linear(&values, 0.75),
            max: values[count - 1],
        }))
    }

    /// Sample standard deviation (ddof = 1); zero for fewer than two values.
    fn sample_std(values: &[f64], mean: f64) -> f64 {
        let n = values.len() as f64;
        if n <= 1.0 {
            return 0.0;
        }
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    }

    /// Pairwise Pearson correlation matrix over the given numeric columns,
    /// consumed by the render boundary for the heatmap artifact.
    ///
    /// Correlations are computed over rows where both columns are present;
    /// undefined correlations (fewer than two common rows, zero variance)
    /// are reported as 0.0 so the matrix stays JSON-safe.
    pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut data: Vec<Vec<Option<f64>>> = Vec::with_capacity(columns.len());
        for name in columns {
            let series = df
                .column(name.as_str())
                .context(format!("correlation input column '{}'", name))?
                .as_materialized_series()
                .clone();
            let float_series = series.cast(&DataType::Float64)?;
            data.push(float_series.f64()?.into_iter().collect());
        }

        let k = columns.len();
        let mut matrix = vec![vec![0.0; k]; k];
        for i in 0..k {
            matrix[i][i] = 1.0;
            for j in (i + 1)..k {
                let r = Self::pearson(&data[i], &data[j]);
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }
        Ok(matrix)
    }

    fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> f64 {
        let pairs: Vec<(f64, f64)> = a
            .iter()
            .zip(b.iter())
            .filter_map(|(x, y)| x.zip(*y))
            .collect();

        if pairs.len() < 2 {
            return 0.0;
        }

        let n = pairs.len() as f64;
        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in &pairs {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        let denom = (var_x * var_y).sqrt();
        if denom == 0.0 { 0.0 } else { cov / denom }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summarize_shape_and_dtypes() {
        let df = df![
            "age" => [30i64, 40, 50],
            "name" => ["a", "b", "c"],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        assert_eq!(record.row_count, 3);
        assert_eq!(record.column_count, 2);
        assert_eq!(record.columns[0].name, "age");
        assert!(record.columns[0].stats.is_some());
        assert!(record.columns[1].stats.is_none());
    }

    #[test]
    fn test_summarize_is_pure() {
        let df = df![
            "v" => [Some(1.0), None, Some(3.0)],
            "t" => ["x", "y", "z"],
        ]
        .unwrap();

        let first = Summarizer::summarize(&df).unwrap();
        let second = Summarizer::summarize(&df).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_summarize_missing_counts() {
        let df = df![
            "v" => [Some(1.0), None, None],
            "t" => [Some("x"), None, Some("z")],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        assert_eq!(record.column("v").unwrap().missing_count, 2);
        assert_eq!(record.column("t").unwrap().missing_count, 1);
    }

    #[test]
    fn test_describe_known_values() {
        let df = df![
            "v" => [1.0, 2.0, 3.0, 4.0, 5.0],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        let stats = record.column("v").unwrap().stats.as_ref().unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, 3.0);
        // Sample std of 1..=5: sqrt(10/4)
        assert!((stats.std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q25, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q75, 4.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_describe_interpolated_percentiles() {
        let df = df![
            "v" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        let stats = record.column("v").unwrap().stats.as_ref().unwrap();
        assert_eq!(stats.q25, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q75, 3.25);
    }

    #[test]
    fn test_describe_ignores_missing_values() {
        let df = df![
            "v" => [Some(10.0), None, Some(20.0)],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        let stats = record.column("v").unwrap().stats.as_ref().unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, 15.0);
    }

    #[test]
    fn test_describe_all_missing_has_no_stats() {
        let df = df![
            "v" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let record = Summarizer::summarize(&df).unwrap();
        let col = record.column("v").unwrap();
        assert!(col.stats.is_none());
        assert_eq!(col.missing_count, 2);
    }

    #[test]
    fn test_correlation_matrix_perfect_correlation() {
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [2.0, 4.0, 6.0],
            "c" => [3.0, 2.0, 1.0],
        ]
        .unwrap();
        let cols = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let m = Summarizer::correlation_matrix(&df, &cols).unwrap();
        assert_eq!(m[0][0], 1.0);
        assert!((m[0][1] - 1.0).abs() < 1e-12);
        assert!((m[0][2] + 1.0).abs() < 1e-12);
        assert_eq!(m[0][1], m[1][0]);
    }

    #[test]
    fn test_correlation_matrix_constant_column_is_zero() {
        let df = df![
            "a" => [1.0, 2.0, 3.0],
            "b" => [5.0, 5.0, 5.0],
        ]
        .unwrap();
        let cols = vec!["a".to_string(), "b".to_string()];

        let m = Summarizer::correlation_matrix(&df, &cols).unwrap();
        assert_eq!(m[0][1], 0.0);
        assert_eq!(m[1][1], 1.0);
    }
}
