//! Isolation Forest: relative anomaly scores for a batch of companies.

pub mod ensemble;
pub mod tree;

pub use ensemble::{
    AnomalyForest, DEFAULT_MAX_SAMPLES, DEFAULT_TREE_COUNT, fit_score, normalize_scores,
    peer_outliers, tree_seed,
};
pub use tree::IsolationTree;
