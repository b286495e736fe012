//! Shared utilities for the analysis pipeline.

use crate::error::{AnalysisError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Runtime dtype label for report output.
pub fn dtype_label(dtype: &DataType) -> String {
    format!("{}", dtype)
}

/// Non-missing values of a series as `f64`, in row order.
pub fn non_null_f64(series: &Series) -> Result<Vec<f64>> {
    let non_null = series.drop_nulls();
    let float_series = non_null.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().flatten().collect())
}

/// Percentile of pre-sorted values using linear interpolation between
/// closest ranks.
///
/// `sorted` must be ascending and non-empty; `q` is in [0.0, 1.0].
pub fn quantile_linear(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

/// Extract the numeric sub-table as a row-major `Array2<f64>`.
///
/// The model stages require a fully resolved sub-table: any remaining
/// missing value fails with [`AnalysisError::InvalidInput`] naming the
/// requesting stage, since the model stages never impute internally.
pub fn numeric_matrix(df: &DataFrame, columns: &[String], stage: &str) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = columns.len();
    let mut data = vec![0.0; n_rows * n_cols];

    for (j, name) in columns.iter().enumerate() {
        let column = df.column(name.as_str())?;
        let series = column.as_materialized_series();
        if series.null_count() > 0 {
            return Err(AnalysisError::InvalidInput {
                stage: stage.to_string(),
                reason: format!(
                    "column '{}' still has {} missing values",
                    name,
                    series.null_count()
                ),
            });
        }
        let float_series = series.cast(&DataType::Float64)?;
        for (i, value) in float_series.f64()?.into_iter().enumerate() {
            data[i * n_cols + j] = value.unwrap_or(f64::NAN);
        }
    }

    Array2::from_shape_vec((n_rows, n_cols), data).map_err(|e| AnalysisError::InvalidInput {
        stage: stage.to_string(),
        reason: format!("could not shape numeric sub-table: {}", e),
    })
}
