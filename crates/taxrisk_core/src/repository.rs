//! Storage boundary of the engine.
//!
//! A scoring run touches storage only through [`RiskRepository`]. Reads happen
//! before any write; writes are ordered suspicious flags first, risk fields
//! second. Nothing is retried here: a failed call aborts the run and the
//! error reaches the caller unchanged.

use std::fmt;

use crate::model::{CompanyId, CompanySummary, DocumentId, DocumentSummary};
use crate::risk::RiskLevel;

/// Failure reported by a repository implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// Repository operation that failed (e.g. `"list_documents"`).
    pub operation: &'static str,
    pub reason: String,
}

impl RepositoryError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "repository {} failed: {}", self.operation, self.reason)
    }
}

impl std::error::Error for RepositoryError {}

/// Companies and documents the engine scores.
pub trait RiskRepository {
    /// All companies in the current snapshot.
    fn list_companies(&self) -> Result<Vec<CompanySummary>, RepositoryError>;

    /// Documents owned by `company_id`. Ordering does not affect scoring.
    fn list_documents(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<DocumentSummary>, RepositoryError>;

    /// Store a company's risk fields. Must be atomic per company.
    fn update_company_risk(
        &mut self,
        company_id: CompanyId,
        score: f64,
        level: RiskLevel,
    ) -> Result<(), RepositoryError>;

    /// Set a document's suspicious flag. Must be idempotent.
    fn mark_document_suspicious(
        &mut self,
        document_id: DocumentId,
        suspicious: bool,
    ) -> Result<(), RepositoryError>;
}
