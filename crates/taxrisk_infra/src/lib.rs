#![forbid(unsafe_code)]

pub mod config;
pub mod runner;
pub mod store;

pub use runner::{RiskRunner, RunnerError, RunnerMetrics};
pub use store::{LedgerAppendError, LedgerRepository};
