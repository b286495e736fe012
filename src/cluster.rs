//! Centroid-based cluster assignment over the numeric sub-table.
//!
//! Standard k-means: k-means++ seeding, then alternating assignment and
//! centroid-update steps until labels stop changing or the total centroid
//! shift drops below tolerance. Runs single-threaded on the same numeric
//! sub-table the anomaly detector uses, with the run's explicit seed.

use crate::config::RunConfig;
use crate::error::{AnalysisError, Result};
use crate::utils::numeric_matrix;
use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

const MAX_ITERATIONS: usize = 300;
const CONVERGENCE_TOLERANCE: f64 = 1e-4;

/// K-means model parameterized by cluster count.
pub struct KMeans {
    k: usize,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Partition the rows of `x` into `k` clusters and return one id in
    /// `[0, k-1]` per row. Requires `x.nrows() >= k`.
    pub fn fit_predict(&self, x: &Array2<f64>, seed: u64) -> Vec<u32> {
        let n_rows = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut centroids = Self::seed_centroids(x, self.k, &mut rng);
        let mut labels = vec![0usize; n_rows];

        for iteration in 0..MAX_ITERATIONS {
            // Assignment step
            let mut changed = 0usize;
            for i in 0..n_rows {
                let (nearest, _) = Self::nearest_centroid(x.row(i), &centroids);
                if labels[i] != nearest {
                    labels[i] = nearest;
                    changed += 1;
                }
            }

            // Update step
            let mut new_centroids = Array2::zeros(centroids.dim());
            let mut counts = vec![0usize; self.k];
            for i in 0..n_rows {
                let c = labels[i];
                counts[c] += 1;
                for j in 0..x.ncols() {
                    new_centroids[[c, j]] += x[[i, j]];
                }
            }
            for c in 0..self.k {
                if counts[c] > 0 {
                    for j in 0..x.ncols() {
                        new_centroids[[c, j]] /= counts[c] as f64;
                    }
                } else {
                    // Empty cluster: reseed on a random row
                    let idx = rng.gen_range(0..n_rows);
                    new_centroids.row_mut(c).assign(&x.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();
            centroids = new_centroids;

            if changed == 0 || shift < CONVERGENCE_TOLERANCE {
                debug!("K-means converged after {} iterations", iteration + 1);
                break;
            }
        }

        labels.into_iter().map(|l| l as u32).collect()
    }

    /// K-means++ seeding: the first centroid is uniform, later ones are
    /// drawn with probability proportional to the squared distance to the
    /// nearest already-chosen centroid.
    fn seed_centroids(x: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n_rows = x.nrows();
        let mut centroids = Array2::zeros((k, x.ncols()));

        let first = rng.gen_range(0..n_rows);
        centroids.row_mut(0).assign(&x.row(first));

        for c in 1..k {
            let weights: Vec<f64> = (0..n_rows)
                .map(|i| {
                    (0..c)
                        .map(|j| Self::squared_distance(x.row(i), centroids.row(j)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                let idx = rng.gen_range(0..n_rows);
                centroids.row_mut(c).assign(&x.row(idx));
                continue;
            }

            let target = rng.gen_range(0.0..1.0) * total;
            let mut cumulative = 0.0;
            let mut chosen = n_rows - 1;
            for (i, w) in weights.iter().enumerate() {
                cumulative += w;
                if cumulative >= target {
                    chosen = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&x.row(chosen));
        }

        centroids
    }

    fn nearest_centroid(row: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let d = Self::squared_distance(row, centroid);
            if d < best_dist {
                best_dist = d;
                best = c;
            }
        }
        (best, best_dist)
    }

    fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }
}

/// Assigns each row of the numeric sub-table to one of `k` clusters.
pub struct ClusterAssigner;

impl ClusterAssigner {
    /// Partition rows into `config.clusters` clusters.
    ///
    /// Returns `None` when `numeric_columns` is empty (skip condition).
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InvalidInput`] when the row count is below the
    /// cluster count or missing values remain in the numeric sub-table.
    pub fn assign(
        df: &polars::prelude::DataFrame,
        numeric_columns: &[String],
        config: &RunConfig,
    ) -> Result<Option<Vec<u32>>> {
        if numeric_columns.is_empty() {
            return Ok(None);
        }

        let x = numeric_matrix(df, numeric_columns, "clustering")?;
        if x.nrows() < config.clusters {
            return Err(AnalysisError::InvalidInput {
                stage: "clustering".to_string(),
                reason: format!(
                    "{} rows cannot form {} non-empty clusters",
                    x.nrows(),
                    config.clusters
                ),
            });
        }

        let labels = KMeans::new(config.clusters).fit_predict(&x, config.seed);
        info!(
            "Clustering assigned {} rows across {} clusters",
            labels.len(),
            config.clusters
        );
        Ok(Some(labels))
    }
}
