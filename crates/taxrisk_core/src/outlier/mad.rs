//! Robust z-scores using the Median Absolute Deviation.
//!
//! `z = |x - median| / (scale * MAD)`, with `MAD = median(|x - median|)`.
//! A zero MAD is replaced by `1.0`, so a company whose amounts are all equal
//! never flags anything. Scores are computed per company only; amounts of
//! different companies are never pooled.

use crate::model::DocumentSummary;
use crate::numeric::{median, safe_div};
use crate::repository::{RepositoryError, RiskRepository};

/// Rescales MAD to a standard deviation under a normal distribution.
pub const MAD_NORMAL_SCALE: f64 = 1.4826;

/// A document is suspicious when its robust z-score is strictly above this.
pub const SUSPICIOUS_Z_THRESHOLD: f64 = 3.5;

/// Robust z-score of every amount, in input order. Empty in, empty out.
pub fn robust_z_scores(amounts: &[f64], mad_scale: f64) -> Vec<f64> {
    let Some(center) = median(amounts) else {
        return Vec::new();
    };
    let deviations: Vec<f64> = amounts.iter().map(|a| (a - center).abs()).collect();
    let mad = match median(&deviations) {
        Some(m) if m != 0.0 => m,
        _ => 1.0,
    };
    let denom = mad_scale * mad;
    deviations.iter().map(|d| d / denom).collect()
}

/// `true` for every amount whose robust z-score exceeds `threshold`.
pub fn flag_outliers(amounts: &[f64], mad_scale: f64, threshold: f64) -> Vec<bool> {
    robust_z_scores(amounts, mad_scale)
        .into_iter()
        .map(|z| z > threshold)
        .collect()
}

/// Documents examined and flagged during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuspicionTally {
    examined: u64,
    suspicious: u64,
}

impl SuspicionTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn examined(&self) -> u64 {
        self.examined
    }

    pub fn suspicious(&self) -> u64 {
        self.suspicious
    }

    /// Suspicious over examined, in `[0, 1]`; `0.0` when nothing was examined.
    pub fn ratio(&self) -> f64 {
        safe_div(self.suspicious as f64, self.examined as f64)
    }

    pub fn absorb(&mut self, other: SuspicionTally) {
        self.examined += other.examined;
        self.suspicious += other.suspicious;
    }

    fn record(&mut self, suspicious: bool) {
        self.examined += 1;
        if suspicious {
            self.suspicious += 1;
        }
    }
}

/// Flag one company's documents and write every flag through `repo`.
///
/// Every document is written, suspicious or not, so a flag set by an older
/// run is cleared when the document is no longer an outlier.
pub fn mark_company_outliers<R: RiskRepository + ?Sized>(
    repo: &mut R,
    documents: &[DocumentSummary],
    mad_scale: f64,
    threshold: f64,
) -> Result<SuspicionTally, RepositoryError> {
    let mut tally = SuspicionTally::new();
    if documents.is_empty() {
        return Ok(tally);
    }

    let amounts: Vec<f64> = documents.iter().map(|d| d.amount).collect();
    let flags = flag_outliers(&amounts, mad_scale, threshold);
    for (doc, suspicious) in documents.iter().zip(flags) {
        repo.mark_document_suspicious(doc.id, suspicious)?;
        tally.record(suspicious);
    }
    Ok(tally)
}
