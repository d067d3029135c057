//! A single isolation tree stored as a flat node arena.

use rand::Rng;

use crate::features::{FEATURE_COUNT, FeatureRow};
use crate::numeric::average_path_length;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// Terminal node holding `size` training points.
    Leaf { size: usize },
    /// Points with `row[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Random partition tree over a subsample of feature rows.
#[derive(Debug, Clone)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Grow a tree over `rows[sample]`, stopping at `max_depth` or singletons.
    ///
    /// Each split picks a feature uniformly among those that still vary in
    /// the node, then a threshold uniformly in `[min, max)`. A node whose
    /// points are identical on every feature becomes a leaf.
    pub fn build<R: Rng + ?Sized>(
        rows: &[FeatureRow],
        sample: Vec<usize>,
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, sample, 0, max_depth, rng);
        tree
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the leaf reached by `row`, plus `c(leaf size)` for leaves
    /// that still hold more than one training point.
    pub fn path_length(&self, row: &FeatureRow) -> f64 {
        let mut idx = 0;
        let mut depth = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                    depth += 1;
                }
                Some(Node::Leaf { size }) => {
                    return depth as f64 + average_path_length(*size);
                }
                None => return depth as f64,
            }
        }
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        rows: &[FeatureRow],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut R,
    ) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= max_depth || indices.len() <= 1 {
            return node_idx;
        }

        let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(FEATURE_COUNT);
        for feature in 0..FEATURE_COUNT {
            let (lo, hi) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| (lo.min(rows[i][feature]), hi.max(rows[i][feature])),
            );
            if lo < hi {
                candidates.push((feature, lo, hi));
            }
        }
        if candidates.is_empty() {
            return node_idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][feature] <= threshold);

        let left = self.grow(rows, left_idx, depth + 1, max_depth, rng);
        let right = self.grow(rows, right_idx, depth + 1, max_depth, rng);
        self.nodes[node_idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        node_idx
    }
}
