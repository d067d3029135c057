//! Isolation Forest ensemble.
//!
//! Anomalies need fewer random partitions to isolate than typical points, so
//! their average path length across trees is short. For a point `x`:
//!
//! - `s(x) = 2^(-E[h(x)] / c(ψ))` with `ψ` the per-tree subsample size;
//!   near 1 means easily isolated, near 0.5 means typical.
//! - [`AnomalyForest::score_samples`] reports `-s(x)` (lower is more
//!   anomalous), the convention [`normalize_scores`] expects.
//!
//! Each tree draws from its own ChaCha8 stream seeded with
//! `xxh64(tree_index, run_seed)`, so a tree's shape depends only on the run
//! seed and its index. Trees can therefore be built in any order, or in
//! parallel, without changing a single bit of the output.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use xxhash_rust::xxh64::xxh64;

use super::tree::IsolationTree;
use crate::features::FeatureRow;
use crate::numeric::average_path_length;

/// Reference ensemble size.
pub const DEFAULT_TREE_COUNT: usize = 200;

/// Reference cap on the per-tree subsample size.
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Seed of the generator that builds tree `tree_index` in a run seeded with `run_seed`.
pub fn tree_seed(run_seed: u64, tree_index: usize) -> u64 {
    xxh64(&(tree_index as u64).to_le_bytes(), run_seed)
}

/// Fitted ensemble of isolation trees.
#[derive(Debug, Clone)]
pub struct AnomalyForest {
    trees: Vec<IsolationTree>,
    subsample_size: usize,
}

impl AnomalyForest {
    /// Fit `tree_count` trees over `rows`, each on `min(rows, max_samples)`
    /// rows drawn without replacement, depth-capped at `ceil(log2(ψ))`.
    pub fn fit(rows: &[FeatureRow], tree_count: usize, max_samples: usize, seed: u64) -> Self {
        let subsample_size = rows.len().min(max_samples);
        if subsample_size == 0 {
            return Self {
                trees: Vec::new(),
                subsample_size,
            };
        }

        let max_depth = (subsample_size as f64).log2().ceil() as usize;
        let trees = (0..tree_count)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(tree_seed(seed, t));
                let sample = index::sample(&mut rng, rows.len(), subsample_size).into_vec();
                IsolationTree::build(rows, sample, max_depth, &mut rng)
            })
            .collect();

        Self {
            trees,
            subsample_size,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    /// `E[h(x)]` over all trees.
    pub fn mean_path_length(&self, row: &FeatureRow) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.path_length(row)).sum();
        total / self.trees.len() as f64
    }

    /// `s(x)` in `(0, 1]`.
    ///
    /// A forest fitted on fewer than two rows has `c(ψ) = 0` and nothing to
    /// compare against; every point then scores 0.5.
    pub fn anomaly_score(&self, row: &FeatureRow) -> f64 {
        let norm = average_path_length(self.subsample_size);
        if self.trees.is_empty() || norm <= 0.0 {
            return 0.5;
        }
        2f64.powf(-self.mean_path_length(row) / norm)
    }

    /// `-s(x)` per row: lower is more anomalous.
    pub fn score_samples(&self, rows: &[FeatureRow]) -> Vec<f64> {
        rows.iter().map(|r| -self.anomaly_score(r)).collect()
    }
}

/// Batch-relative anomaly in `[0, 1]` from [`AnomalyForest::score_samples`] output.
///
/// `1 - (s - min) / (max - min)`: the lowest sample scores 1. When every
/// sample is equal the span is taken as 1.0 and every row scores 1.0.
pub fn normalize_scores(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let (min, max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    let span = if max - min == 0.0 { 1.0 } else { max - min };
    samples.iter().map(|s| 1.0 - (s - min) / span).collect()
}

/// Fit a forest on `rows` and return each row's normalized anomaly.
pub fn fit_score(
    rows: &[FeatureRow],
    tree_count: usize,
    max_samples: usize,
    seed: u64,
) -> Vec<f64> {
    let forest = AnomalyForest::fit(rows, tree_count, max_samples, seed);
    normalize_scores(&forest.score_samples(rows))
}

/// Mark the rows scoring strictly below the `contamination` percentile of
/// `samples`.
///
/// The percentile interpolates linearly between order statistics. Tied
/// samples share one side of the cutoff, so a batch of equal scores flags
/// nothing.
pub fn peer_outliers(samples: &[f64], contamination: f64) -> Vec<bool> {
    let n = samples.len();
    if n == 0 || contamination.is_nan() || contamination <= 0.0 {
        return vec![false; n];
    }
    let threshold = percentile(samples, contamination.min(1.0));
    samples.iter().map(|&s| s < threshold).collect()
}

/// `q`-quantile (`q` in `[0, 1]`) of a non-empty slice, linear between ranks.
fn percentile(samples: &[f64], q: f64) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
}
