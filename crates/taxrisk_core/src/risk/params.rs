//! Tunable constants of a scoring run.
//!
//! `ScoringParams::default()` carries the reference values; changing any of
//! them changes every issued score. Validation runs at the start of every
//! scoring run and a bad value aborts it before any repository call.

use std::fmt;

use super::level::{HIGH_FLOOR, RISKY_FLOOR, RiskLevel};
use crate::forest::{DEFAULT_MAX_SAMPLES, DEFAULT_TREE_COUNT};
use crate::outlier::{MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD};

/// Weights of the three score components. Reference values sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Company anomaly relative to its peers.
    pub anomaly: f64,
    /// Share of documents not reported.
    pub reported: f64,
    /// Run-wide share of suspicious documents.
    pub suspicious: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            anomaly: 0.60,
            reported: 0.25,
            suspicious: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringParams {
    pub tree_count: usize,
    pub max_samples: usize,
    pub mad_scale: f64,
    pub suspicious_z_threshold: f64,
    pub weights: ScoreWeights,
    pub risky_floor: f64,
    pub high_floor: f64,
    /// Share of companies reported as peer outliers. Does not affect scores.
    pub contamination: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            max_samples: DEFAULT_MAX_SAMPLES,
            mad_scale: MAD_NORMAL_SCALE,
            suspicious_z_threshold: SUSPICIOUS_Z_THRESHOLD,
            weights: ScoreWeights::default(),
            risky_floor: RISKY_FLOOR,
            high_floor: HIGH_FLOOR,
            contamination: 0.08,
        }
    }
}

/// A scoring parameter outside its valid domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringParamsError {
    pub param: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for ScoringParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scoring parameter '{}': {}", self.param, self.reason)
    }
}

impl std::error::Error for ScoringParamsError {}

fn invalid(param: &'static str, reason: &'static str) -> Result<(), ScoringParamsError> {
    Err(ScoringParamsError { param, reason })
}

impl ScoringParams {
    pub fn validate(&self) -> Result<(), ScoringParamsError> {
        if self.tree_count == 0 {
            return invalid("tree_count", "ensemble needs at least one tree");
        }
        if self.max_samples == 0 {
            return invalid("max_samples", "subsample size must be at least 1");
        }
        if !self.mad_scale.is_finite() || self.mad_scale <= 0.0 {
            return invalid("mad_scale", "must be finite and positive");
        }
        if !self.suspicious_z_threshold.is_finite() || self.suspicious_z_threshold < 0.0 {
            return invalid("suspicious_z_threshold", "must be finite and non-negative");
        }
        for (name, w) in [
            ("anomaly_weight", self.weights.anomaly),
            ("reported_weight", self.weights.reported),
            ("suspicious_weight", self.weights.suspicious),
        ] {
            if !w.is_finite() || w < 0.0 {
                return invalid(name, "must be finite and non-negative");
            }
        }
        if !self.risky_floor.is_finite() || self.risky_floor < 0.0 {
            return invalid("risky_floor", "must be finite and non-negative");
        }
        if !self.high_floor.is_finite() || self.high_floor <= self.risky_floor {
            return invalid("high_floor", "must be finite and above risky_floor");
        }
        if !self.contamination.is_finite() || !(0.0..=0.5).contains(&self.contamination) {
            return invalid("contamination", "must lie in [0, 0.5]");
        }
        Ok(())
    }

    /// Level of `score` under this parameter set's band floors.
    pub fn level_for(&self, score: f64) -> RiskLevel {
        RiskLevel::from_score_with(score, self.risky_floor, self.high_floor)
    }
}
