//! One scoring run, end to end.
//!
//! Order of operations:
//! 1. Validate parameters, list companies. No companies: return, no writes.
//! 2. Read every company's documents once and derive its feature vector.
//! 3. Fit the forest on the whole batch; normalize to per-company anomaly.
//! 4. Phase 1 write-back: suspicious flag of every document.
//! 5. Phase 2 write-back: score and level of every company.
//!
//! Phase 1 is not rolled back when phase 2 fails. Re-running with the same
//! seed on unchanged data rewrites the same flags and scores, so a failed run
//! is retried by running it again.

use std::fmt;

use super::level::RiskLevel;
use super::params::{ScoreWeights, ScoringParams, ScoringParamsError};
use crate::features::{FeatureRow, FeatureVector, extract_features};
use crate::forest::{AnomalyForest, normalize_scores, peer_outliers};
use crate::model::CompanyId;
use crate::outlier::{SuspicionTally, mark_company_outliers};
use crate::repository::{RepositoryError, RiskRepository};

/// Outcome of a run for one company.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanyRisk {
    pub company_id: CompanyId,
    /// 0-100.
    pub score: f64,
    pub level: RiskLevel,
    /// Batch-relative anomaly in `[0, 1]`.
    pub anomaly: f64,
    /// `1 - reported_ratio`.
    pub reported_penalty: f64,
    /// Scored strictly below the `contamination` percentile of the batch.
    pub peer_outlier: bool,
}

/// Everything a run wrote, in `list_companies` order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub seed: u64,
    pub companies: Vec<CompanyRisk>,
    pub tally: SuspicionTally,
}

impl RunReport {
    fn empty(seed: u64) -> Self {
        Self {
            seed,
            companies: Vec::new(),
            tally: SuspicionTally::new(),
        }
    }

    /// True when the run found no companies and wrote nothing.
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    pub fn global_suspicious_ratio(&self) -> f64 {
        self.tally.ratio()
    }

    pub fn company(&self, company_id: CompanyId) -> Option<&CompanyRisk> {
        self.companies.iter().find(|c| c.company_id == company_id)
    }
}

/// Terminal failure of a scoring run.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskRunError {
    /// Parameters rejected before any repository call.
    Misconfigured(ScoringParamsError),
    /// The repository failed; the run stopped at that call.
    Repository(RepositoryError),
}

impl fmt::Display for RiskRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Misconfigured(err) => write!(f, "risk run misconfigured: {err}"),
            Self::Repository(err) => write!(f, "risk run aborted: {err}"),
        }
    }
}

impl std::error::Error for RiskRunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Misconfigured(err) => Some(err),
            Self::Repository(err) => Some(err),
        }
    }
}

impl From<ScoringParamsError> for RiskRunError {
    fn from(err: ScoringParamsError) -> Self {
        Self::Misconfigured(err)
    }
}

impl From<RepositoryError> for RiskRunError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

/// `100 * (w_a * anomaly + w_r * reported_penalty + w_s * global_suspicious_ratio)`.
pub fn compose_score(
    anomaly: f64,
    reported_penalty: f64,
    global_suspicious_ratio: f64,
    weights: &ScoreWeights,
) -> f64 {
    100.0
        * (weights.anomaly * anomaly
            + weights.reported * reported_penalty
            + weights.suspicious * global_suspicious_ratio)
}

/// Score every company in `repo` with the reference parameters.
pub fn compute_and_update_risk<R: RiskRepository + ?Sized>(
    repo: &mut R,
    seed: u64,
) -> Result<RunReport, RiskRunError> {
    compute_and_update_risk_with(repo, seed, &ScoringParams::default())
}

/// Score every company in `repo`, writing flags and risk fields back.
pub fn compute_and_update_risk_with<R: RiskRepository + ?Sized>(
    repo: &mut R,
    seed: u64,
    params: &ScoringParams,
) -> Result<RunReport, RiskRunError> {
    params.validate()?;

    let companies = repo.list_companies()?;
    if companies.is_empty() {
        tracing::debug!("RiskRun skipped: no companies seed={}", seed);
        return Ok(RunReport::empty(seed));
    }
    tracing::debug!(
        "RiskRun started companies={} seed={} trees={}",
        companies.len(),
        seed,
        params.tree_count
    );

    let mut ledgers = Vec::with_capacity(companies.len());
    let mut features: Vec<FeatureVector> = Vec::with_capacity(companies.len());
    for company in &companies {
        let documents = repo.list_documents(company.id)?;
        features.push(extract_features(company, &documents));
        ledgers.push(documents);
    }

    let rows: Vec<FeatureRow> = features.iter().map(FeatureVector::as_row).collect();
    let forest = AnomalyForest::fit(&rows, params.tree_count, params.max_samples, seed);
    let samples = forest.score_samples(&rows);
    let anomalies = normalize_scores(&samples);
    let peer_flags = peer_outliers(&samples, params.contamination);

    // Phase 1: suspicious flags.
    let mut tally = SuspicionTally::new();
    for documents in &ledgers {
        let company_tally = mark_company_outliers(
            repo,
            documents,
            params.mad_scale,
            params.suspicious_z_threshold,
        )?;
        tally.absorb(company_tally);
    }
    let global_ratio = tally.ratio();
    tracing::debug!(
        "RiskRun flags written examined={} suspicious={} ratio={}",
        tally.examined(),
        tally.suspicious(),
        global_ratio
    );

    // Phase 2: risk fields.
    let mut results = Vec::with_capacity(companies.len());
    for (((company, feature), anomaly), peer_outlier) in companies
        .iter()
        .zip(&features)
        .zip(anomalies)
        .zip(peer_flags)
    {
        let reported_penalty = 1.0 - feature.reported_ratio;
        let score = compose_score(anomaly, reported_penalty, global_ratio, &params.weights);
        let level = params.level_for(score);
        repo.update_company_risk(company.id, score, level)?;
        results.push(CompanyRisk {
            company_id: company.id,
            score,
            level,
            anomaly,
            reported_penalty,
            peer_outlier,
        });
    }
    tracing::debug!("RiskRun finished companies={}", results.len());

    Ok(RunReport {
        seed,
        companies: results,
        tally,
    })
}
