//! Durable storage: journal-backed company/document repository.

pub mod ledger;

pub use ledger::{LedgerAppendError, LedgerMetrics, LedgerRepository, NewDocument};
