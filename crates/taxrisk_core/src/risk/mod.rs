//! Risk composition: scoring parameters, levels and the run orchestrator.

pub mod composer;
pub mod level;
pub mod params;

pub use composer::{
    CompanyRisk, RiskRunError, RunReport, compose_score, compute_and_update_risk,
    compute_and_update_risk_with,
};
pub use level::{HIGH_FLOOR, RISKY_FLOOR, RiskLevel};
pub use params::{ScoreWeights, ScoringParams, ScoringParamsError};
