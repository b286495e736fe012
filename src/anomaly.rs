//! Isolation-based anomaly detection over the numeric sub-table.
//!
//! An ensemble of randomly grown isolation trees scores each row by its
//! average isolation path length (shorter path = easier to isolate = more
//! anomalous). Scores follow the reference convention
//! `s(x, n) = 2^(-E[h(x)] / c(n))`; the decision threshold is calibrated
//! from the configured contamination fraction in the same fit-and-predict
//! pass. The random source is seeded per run, never ambient.

use crate::config::RunConfig;
use crate::error::Result;
use crate::utils::numeric_matrix;
use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Number of trees in the ensemble.
const TREE_COUNT: usize = 100;

/// Maximum rows sub-sampled per tree.
const MAX_TREE_SAMPLES: usize = 256;

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Binary row label produced by the detector.
///
/// Maps the reference +1/-1 convention to a named categorical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierLabel {
    Inlier,
    Outlier,
}

impl OutlierLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inlier => "inlier",
            Self::Outlier => "outlier",
        }
    }

    /// The reference integer convention: +1 for inliers, -1 for outliers.
    pub fn as_signed(&self) -> i8 {
        match self {
            Self::Inlier => 1,
            Self::Outlier => -1,
        }
    }
}

impl std::fmt::Display for OutlierLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One isolation tree.
#[derive(Debug, Clone)]
enum IsoNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsoNode>,
        right: Box<IsoNode>,
    },
    Leaf {
        size: usize,
    },
}

impl IsoNode {
    /// Grow a tree over the rows in `indices` by random recursive
    /// partitioning.
    fn grow(
        x: &Array2<f64>,
        indices: &[usize],
        depth: usize,
        depth_limit: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let size = indices.len();
        if depth >= depth_limit || size <= 1 {
            return IsoNode::Leaf { size };
        }

        let feature = rng.gen_range(0..x.ncols());
        let values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
        let min_val = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_val = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if (max_val - min_val).abs() < 1e-12 {
            return IsoNode::Leaf { size };
        }

        let threshold = rng.gen_range(min_val..max_val);
        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature]] < threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return IsoNode::Leaf { size };
        }

        IsoNode::Split {
            feature,
            threshold,
            left: Box::new(Self::grow(x, &left_indices, depth + 1, depth_limit, rng)),
            right: Box::new(Self::grow(x, &right_indices, depth + 1, depth_limit, rng)),
        }
    }

    /// Isolation path length for one row.
    fn path_length(&self, row: ArrayView1<'_, f64>, depth: usize) -> f64 {
        match self {
            IsoNode::Leaf { size } => depth as f64 + Self::average_search_depth(*size),
            IsoNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] < *threshold {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }

    /// Average depth of an unsuccessful BST search over `n` values:
    /// `c(n) = 2 H(n-1) - 2 (n-1) / n`.
    fn average_search_depth(n: usize) -> f64 {
        match n {
            0 | 1 => 0.0,
            2 => 1.0,
            _ => {
                let n = n as f64;
                2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
            }
        }
    }
}

/// Fitted isolation-forest ensemble.
pub struct IsolationForest {
    trees: Vec<IsoNode>,
    fit_samples: usize,
}

impl IsolationForest {
    /// Fit an ensemble on `x` from an explicit seed.
    pub fn fit(x: &Array2<f64>, seed: u64) -> Self {
        let n_rows = x.nrows();
        let samples_per_tree = MAX_TREE_SAMPLES.min(n_rows).max(1);
        let depth_limit = (samples_per_tree as f64).log2().ceil().max(1.0) as usize;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(TREE_COUNT);
        for _ in 0..TREE_COUNT {
            let indices: Vec<usize> = (0..samples_per_tree)
                .map(|_| rng.gen_range(0..n_rows))
                .collect();
            trees.push(IsoNode::grow(x, &indices, 0, depth_limit, &mut rng));
        }

        debug!(
            "Fitted {} isolation trees over {} sampled rows each",
            trees.len(),
            samples_per_tree
        );

        Self {
            trees,
            fit_samples: samples_per_tree,
        }
    }

    /// Anomaly score per row in [0, 1]; higher means more anomalous.
    pub fn scores(&self, x: &Array2<f64>) -> Vec<f64> {
        let normalizer = IsoNode::average_search_depth(self.fit_samples);
        x.rows()
            .into_iter()
            .map(|row| {
                if normalizer == 0.0 {
                    return 0.5;
                }
                let avg_path: f64 = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(row, 0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                2.0_f64.powf(-avg_path / normalizer)
            })
            .collect()
    }
}

/// Assigns an inlier/outlier label to every row of the numeric sub-table.
pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Train and score in one pass; returns one label per row.
    ///
    /// Returns `None` when `numeric_columns` is empty (skip condition, not
    /// an error). Missing values must already be resolved; remaining nulls
    /// fail with [`crate::error::AnalysisError::InvalidInput`].
    pub fn detect(
        df: &polars::prelude::DataFrame,
        numeric_columns: &[String],
        config: &RunConfig,
    ) -> Result<Option<Vec<OutlierLabel>>> {
        if numeric_columns.is_empty() {
            return Ok(None);
        }

        let x = numeric_matrix(df, numeric_columns, "anomaly detection")?;
        if x.nrows() == 0 {
            return Ok(Some(Vec::new()));
        }

        let forest = IsolationForest::fit(&x, config.seed);
        let scores = forest.scores(&x);
        let threshold = Self::decision_threshold(&scores, config.contamination);

        let labels: Vec<OutlierLabel> = scores
            .iter()
            .map(|&s| {
                if s > threshold {
                    OutlierLabel::Outlier
                } else {
                    OutlierLabel::Inlier
                }
            })
            .collect();

        let outliers = labels.iter().filter(|l| **l == OutlierLabel::Outlier).count();
        info!(
            "Anomaly detection flagged {}/{} rows as outliers",
            outliers,
            labels.len()
        );
        Ok(Some(labels))
    }

    /// Score cutoff calibrated from the contamination fraction: rows
    /// scoring strictly above the value at rank `floor(contamination * n)`
    /// (descending) are outliers, flagging at most that many rows.
    fn decision_threshold(scores: &[f64], contamination: f64) -> f64 {
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let rank = ((contamination * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
        sorted[rank]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn clustered_frame_with_outliers() -> DataFrame {
        // 50 points in a tight cluster plus two extremes
        let mut a: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let mut b: Vec<f64> = (0..50).map(|i| ((i % 10) + 1) as f64).collect();
        a.extend_from_slice(&[120.0, -90.0]);
        b.extend_from_slice(&[120.0, -90.0]);
        df!["a" => a, "b" => b].unwrap()
    }

    #[test]
    fn test_detect_skips_without_numeric_columns() {
        let df = df!["t" => ["x", "y"]].unwrap();
        let labels = AnomalyDetector::detect(&df, &[], &RunConfig::default()).unwrap();
        assert!(labels.is_none());
    }

    #[test]
    fn test_detect_flags_extremes() {
        let df = clustered_frame_with_outliers();
        let labels = AnomalyDetector::detect(&df, &names(&["a", "b"]), &RunConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(labels.len(), 52);
        assert_eq!(labels[50], OutlierLabel::Outlier);
        assert_eq!(labels[51], OutlierLabel::Outlier);

        // Contamination-calibrated: roughly 5% of 52 rows
        let outliers = labels.iter().filter(|l| **l == OutlierLabel::Outlier).count();
        assert!(outliers <= 3, "flagged {} rows", outliers);
    }

    #[test]
    fn test_detect_is_deterministic_for_fixed_seed() {
        let df = clustered_frame_with_outliers();
        let cols = names(&["a", "b"]);
        let config = RunConfig::default();

        let first = AnomalyDetector::detect(&df, &cols, &config).unwrap().unwrap();
        let second = AnomalyDetector::detect(&df, &cols, &config).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_detect_rejects_remaining_missing_values() {
        let df = df!["v" => [Some(1.0), None, Some(3.0)]].unwrap();
        let err = AnomalyDetector::detect(&df, &names(&["v"]), &RunConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_uniform_data_flags_nothing() {
        let df = df!["v" => vec![5.0; 20]].unwrap();
        let labels = AnomalyDetector::detect(&df, &names(&["v"]), &RunConfig::default())
            .unwrap()
            .unwrap();
        assert!(labels.iter().all(|l| *l == OutlierLabel::Inlier));
    }

    #[test]
    fn test_scores_rank_extremes_highest() {
        let df = clustered_frame_with_outliers();
        let x = numeric_matrix(&df, &names(&["a", "b"]), "test").unwrap();
        let forest = IsolationForest::fit(&x, 42);
        let scores = forest.scores(&x);

        assert!(scores[50] > scores[0]);
        assert!(scores[51] > scores[0]);
    }

    #[test]
    fn test_average_search_depth_known_values() {
        assert_eq!(IsoNode::average_search_depth(0), 0.0);
        assert_eq!(IsoNode::average_search_depth(1), 0.0);
        assert_eq!(IsoNode::average_search_depth(2), 1.0);
        // c(3) = 2 (ln 2 + gamma) - 4/3
        let c3 = IsoNode::average_search_depth(3);
        assert!((c3 - (2.0 * (2.0f64.ln() + EULER_MASCHERONI) - 4.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_outlier_label_conventions() {
        assert_eq!(OutlierLabel::Inlier.as_signed(), 1);
        assert_eq!(OutlierLabel::Outlier.as_signed(), -1);
        assert_eq!(OutlierLabel::Outlier.to_string(), "outlier");
    }
}
