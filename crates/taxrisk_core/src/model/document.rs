use serde::{Deserialize, Serialize};

use super::CompanyId;

pub type DocumentId = u64;

/// Direction of money on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Invoice issued by the company (counts toward revenue).
    Income,
    /// Receipt for money paid out (counts toward expenses).
    Outflow,
}

/// An invoice or receipt as stored by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub company_id: CompanyId,
    pub kind: DocumentKind,
    pub amount: f64,
    /// Set by the collaborator that files the document, never by a scoring run.
    pub reported: bool,
    pub vendor: Option<String>,
    /// ISO `YYYY-MM-DD`. Only used for ordering listings.
    pub date: String,
    /// Set by the outlier pass of a scoring run.
    pub suspicious: bool,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            kind: self.kind,
            amount: self.amount,
            reported: self.reported,
        }
    }
}

/// The fields of a document the engine reads during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub amount: f64,
    pub reported: bool,
}
