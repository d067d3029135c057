use serde::{Deserialize, Serialize};

/// Lowest score that maps to [`RiskLevel::Risky`].
pub const RISKY_FLOOR: f64 = 33.34;

/// Lowest score that maps to [`RiskLevel::High`].
pub const HIGH_FLOOR: f64 = 66.67;

/// Categorical bucket of a 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Risky,
    High,
}

impl RiskLevel {
    /// `[0, 33.34) -> Low`, `[33.34, 66.67) -> Risky`, `[66.67, ..] -> High`.
    pub fn from_score(score: f64) -> Self {
        Self::from_score_with(score, RISKY_FLOOR, HIGH_FLOOR)
    }

    /// Step mapping with explicit band floors. Each floor belongs to the
    /// upper band. A NaN score lands in `High` (fail-closed).
    pub fn from_score_with(score: f64, risky_floor: f64, high_floor: f64) -> Self {
        if score < risky_floor {
            RiskLevel::Low
        } else if score < high_floor {
            RiskLevel::Risky
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Risky => "Risky",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
