//! Ledger entities as seen by the scoring engine.

pub mod company;
pub mod document;

pub use company::{Company, CompanyId, CompanySummary};
pub use document::{Document, DocumentId, DocumentKind, DocumentSummary};
