//! Per-company transaction outlier detection (robust z-score over MAD).

pub mod mad;

pub use mad::{
    MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD, SuspicionTally, flag_outliers, mark_company_outliers,
    robust_z_scores,
};
