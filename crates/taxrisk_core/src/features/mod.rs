//! Per-company feature derivation.

pub mod extract;

pub use extract::{FEATURE_COUNT, FeatureRow, FeatureVector, company_totals, extract_features};
