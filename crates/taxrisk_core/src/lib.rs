#![forbid(unsafe_code)]

pub mod features;
pub mod forest;
pub mod model;
pub mod numeric;
pub mod outlier;
pub mod repository;
pub mod risk;

pub use repository::{RepositoryError, RiskRepository};
pub use risk::{
    CompanyRisk, RiskLevel, RiskRunError, RunReport, ScoringParams, compute_and_update_risk,
    compute_and_update_risk_with,
};
