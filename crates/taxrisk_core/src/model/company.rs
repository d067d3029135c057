use serde::{Deserialize, Serialize};

use crate::risk::RiskLevel;

pub type CompanyId = u64;

/// A company as stored by the repository.
///
/// `risk_score` and `risk_level` are written only by a scoring run and are
/// always consistent under [`RiskLevel::from_score`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub tax_number: String,
    /// Sum of income-type document amounts.
    pub revenue: f64,
    /// Sum of outflow-type document amounts.
    pub expenses: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

impl Company {
    /// New unscored company with zero totals.
    pub fn new(id: CompanyId, name: impl Into<String>, tax_number: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            tax_number: tax_number.into(),
            revenue: 0.0,
            expenses: 0.0,
            risk_score: 0.0,
            risk_level: RiskLevel::Low,
        }
    }

    pub fn summary(&self) -> CompanySummary {
        CompanySummary {
            id: self.id,
            revenue: self.revenue,
            expenses: self.expenses,
        }
    }
}

/// The fields of a company the engine reads during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub revenue: f64,
    pub expenses: f64,
}
