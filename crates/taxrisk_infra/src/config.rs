//! Scoring configuration: per-parameter defaults, override resolution and
//! config-file loading.
//!
//! Every tunable of a scoring run has a reference default. A value given
//! explicitly (e.g. in a config file) takes precedence but must be finite and
//! non-negative; anything else fails closed. The resolved set is then checked
//! as a whole by `ScoringParams::validate` before it is handed to a run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taxrisk_core::ScoringParams;
use taxrisk_core::forest::{DEFAULT_MAX_SAMPLES, DEFAULT_TREE_COUNT};
use taxrisk_core::outlier::{MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD};
use taxrisk_core::risk::{HIGH_FLOOR, RISKY_FLOOR, ScoreWeights, ScoringParamsError};

/// All tunable scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigParam {
    // Anomaly forest
    TreeCount,
    MaxSamples,
    Contamination,

    // Document outliers
    MadScale,
    SuspiciousZThreshold,

    // Score composition
    AnomalyWeight,
    ReportedWeight,
    SuspiciousWeight,

    // Level bands
    RiskyFloor,
    HighFloor,
}

/// Error when a parameter value cannot be resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingConfigError {
    pub param_name: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for MissingConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config fail-closed: '{}' cannot be resolved ({})",
            self.param_name, self.reason
        )
    }
}

impl std::error::Error for MissingConfigError {}

/// Returns the reference default for a parameter, or `None` if none exists.
pub fn default_value(param: ConfigParam) -> Option<f64> {
    let weights = ScoreWeights::default();
    match param {
        ConfigParam::TreeCount => Some(DEFAULT_TREE_COUNT as f64),
        ConfigParam::MaxSamples => Some(DEFAULT_MAX_SAMPLES as f64),
        ConfigParam::Contamination => Some(0.08),

        ConfigParam::MadScale => Some(MAD_NORMAL_SCALE),
        ConfigParam::SuspiciousZThreshold => Some(SUSPICIOUS_Z_THRESHOLD),

        ConfigParam::AnomalyWeight => Some(weights.anomaly),
        ConfigParam::ReportedWeight => Some(weights.reported),
        ConfigParam::SuspiciousWeight => Some(weights.suspicious),

        ConfigParam::RiskyFloor => Some(RISKY_FLOOR),
        ConfigParam::HighFloor => Some(HIGH_FLOOR),
    }
}

/// Returns the snake_case name for a parameter (matches the config-file keys).
pub fn param_name(param: ConfigParam) -> &'static str {
    match param {
        ConfigParam::TreeCount => "tree_count",
        ConfigParam::MaxSamples => "max_samples",
        ConfigParam::Contamination => "contamination",
        ConfigParam::MadScale => "mad_scale",
        ConfigParam::SuspiciousZThreshold => "suspicious_z_threshold",
        ConfigParam::AnomalyWeight => "anomaly_weight",
        ConfigParam::ReportedWeight => "reported_weight",
        ConfigParam::SuspiciousWeight => "suspicious_weight",
        ConfigParam::RiskyFloor => "risky_floor",
        ConfigParam::HighFloor => "high_floor",
    }
}

/// Expected number of ConfigParam variants. Update when adding new variants.
pub const EXPECTED_PARAM_COUNT: usize = 10;

/// All known `ConfigParam` variants (for exhaustive iteration in tests).
pub const ALL_PARAMS: &[ConfigParam] = &[
    ConfigParam::TreeCount,
    ConfigParam::MaxSamples,
    ConfigParam::Contamination,
    ConfigParam::MadScale,
    ConfigParam::SuspiciousZThreshold,
    ConfigParam::AnomalyWeight,
    ConfigParam::ReportedWeight,
    ConfigParam::SuspiciousWeight,
    ConfigParam::RiskyFloor,
    ConfigParam::HighFloor,
];

/// Resolve a configuration value.
///
/// - `Some(v)`: `v`, provided it is finite and non-negative.
/// - `None`: the parameter's default, or `Err` if it has none.
pub fn resolve_config_value(
    param: ConfigParam,
    value: Option<f64>,
) -> Result<f64, MissingConfigError> {
    if let Some(v) = value {
        if !v.is_finite() {
            return Err(MissingConfigError {
                param_name: param_name(param),
                reason: "value is non-finite (NaN or Infinity); fail-closed",
            });
        }
        if v < 0.0 {
            return Err(MissingConfigError {
                param_name: param_name(param),
                reason: "value is negative; all scoring params must be non-negative",
            });
        }
        return Ok(v);
    }
    default_value(param).ok_or_else(|| MissingConfigError {
        param_name: param_name(param),
        reason: "no default; scoring must fail-closed",
    })
}

fn resolve_count(param: ConfigParam, value: Option<f64>) -> Result<usize, MissingConfigError> {
    let v = resolve_config_value(param, value)?;
    if v.fract() != 0.0 || v > u32::MAX as f64 {
        return Err(MissingConfigError {
            param_name: param_name(param),
            reason: "value must be a whole number",
        });
    }
    Ok(v as usize)
}

// --- Config file ----------------------------------------------------------

/// On-disk scoring configuration (JSON). Omitted keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfigFile {
    pub tree_count: Option<f64>,
    pub max_samples: Option<f64>,
    pub contamination: Option<f64>,
    pub mad_scale: Option<f64>,
    pub suspicious_z_threshold: Option<f64>,
    pub anomaly_weight: Option<f64>,
    pub reported_weight: Option<f64>,
    pub suspicious_weight: Option<f64>,
    pub risky_floor: Option<f64>,
    pub high_floor: Option<f64>,
}

impl ScoringConfigFile {
    /// Explicit value for `param`, if the file sets one.
    pub fn value(&self, param: ConfigParam) -> Option<f64> {
        match param {
            ConfigParam::TreeCount => self.tree_count,
            ConfigParam::MaxSamples => self.max_samples,
            ConfigParam::Contamination => self.contamination,
            ConfigParam::MadScale => self.mad_scale,
            ConfigParam::SuspiciousZThreshold => self.suspicious_z_threshold,
            ConfigParam::AnomalyWeight => self.anomaly_weight,
            ConfigParam::ReportedWeight => self.reported_weight,
            ConfigParam::SuspiciousWeight => self.suspicious_weight,
            ConfigParam::RiskyFloor => self.risky_floor,
            ConfigParam::HighFloor => self.high_floor,
        }
    }
}

/// Failure to turn a config file into validated `ScoringParams`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLoadError {
    Io { path: PathBuf, reason: String },
    Parse { path: PathBuf, reason: String },
    Unresolved(MissingConfigError),
    Invalid(ScoringParamsError),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, reason } => {
                write!(f, "failed to read config {}: {reason}", path.display())
            }
            Self::Parse { path, reason } => {
                write!(f, "invalid config {}: {reason}", path.display())
            }
            Self::Unresolved(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<MissingConfigError> for ConfigLoadError {
    fn from(err: MissingConfigError) -> Self {
        Self::Unresolved(err)
    }
}

impl From<ScoringParamsError> for ConfigLoadError {
    fn from(err: ScoringParamsError) -> Self {
        Self::Invalid(err)
    }
}

/// Read and parse a JSON scoring config file.
pub fn load_scoring_config(path: impl AsRef<Path>) -> Result<ScoringConfigFile, ConfigLoadError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Resolve every parameter of `file` and validate the result as a whole.
pub fn build_scoring_params(file: &ScoringConfigFile) -> Result<ScoringParams, ConfigLoadError> {
    let value = |param| resolve_config_value(param, file.value(param));
    let params = ScoringParams {
        tree_count: resolve_count(ConfigParam::TreeCount, file.tree_count)?,
        max_samples: resolve_count(ConfigParam::MaxSamples, file.max_samples)?,
        contamination: value(ConfigParam::Contamination)?,
        mad_scale: value(ConfigParam::MadScale)?,
        suspicious_z_threshold: value(ConfigParam::SuspiciousZThreshold)?,
        weights: ScoreWeights {
            anomaly: value(ConfigParam::AnomalyWeight)?,
            reported: value(ConfigParam::ReportedWeight)?,
            suspicious: value(ConfigParam::SuspiciousWeight)?,
        },
        risky_floor: value(ConfigParam::RiskyFloor)?,
        high_floor: value(ConfigParam::HighFloor)?,
    };
    params.validate()?;
    tracing::debug!(
        "ScoringParams resolved trees={} max_samples={} z_threshold={}",
        params.tree_count,
        params.max_samples,
        params.suspicious_z_threshold
    );
    Ok(params)
}

/// [`load_scoring_config`] followed by [`build_scoring_params`].
pub fn load_scoring_params(path: impl AsRef<Path>) -> Result<ScoringParams, ConfigLoadError> {
    build_scoring_params(&load_scoring_config(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_params_have_defaults() {
        for &param in ALL_PARAMS {
            assert!(
                default_value(param).is_some(),
                "ConfigParam::{:?} ({}) missing from default_value()",
                param,
                param_name(param),
            );
        }
    }

    #[test]
    fn all_params_listed_in_constant() {
        assert_eq!(
            ALL_PARAMS.len(),
            EXPECTED_PARAM_COUNT,
            "ALL_PARAMS length ({}) != EXPECTED_PARAM_COUNT ({}). \
             Did you add a ConfigParam variant without updating ALL_PARAMS?",
            ALL_PARAMS.len(),
            EXPECTED_PARAM_COUNT,
        );
        let mut names: Vec<&str> = ALL_PARAMS.iter().map(|&p| param_name(p)).collect();
        names.sort();
        names.dedup();
        assert_eq!(
            names.len(),
            ALL_PARAMS.len(),
            "ALL_PARAMS has duplicate entries"
        );
    }

    #[test]
    fn file_keys_match_param_names() {
        let file = ScoringConfigFile {
            tree_count: Some(1.0),
            max_samples: Some(2.0),
            contamination: Some(3.0),
            mad_scale: Some(4.0),
            suspicious_z_threshold: Some(5.0),
            anomaly_weight: Some(6.0),
            reported_weight: Some(7.0),
            suspicious_weight: Some(8.0),
            risky_floor: Some(9.0),
            high_floor: Some(10.0),
        };
        let json = serde_json::to_value(&file).unwrap();
        for &param in ALL_PARAMS {
            assert_eq!(
                json[param_name(param)].as_f64(),
                file.value(param),
                "key {} does not map to ConfigParam::{:?}",
                param_name(param),
                param
            );
        }
    }

    #[test]
    fn fractional_tree_count_rejected() {
        let err = resolve_count(ConfigParam::TreeCount, Some(10.5)).unwrap_err();
        assert_eq!(err.param_name, "tree_count");
    }
}
