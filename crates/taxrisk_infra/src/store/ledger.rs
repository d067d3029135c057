//! Company/document ledger backed by an append-only event journal.
//!
//! Every mutation is captured as one JSON line. Opening a durable ledger
//! replays the journal into the latest view; an in-memory ledger skips the
//! file entirely. A mutation is validated against the current view first,
//! then persisted, then applied, so a rejected call leaves no trace in the
//! journal.
//!
//! Company and document ids start at 1, are assigned monotonically and are
//! never reused, including after deletion. Tax numbers are unique among live companies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use taxrisk_core::features::company_totals;
use taxrisk_core::model::{
    Company, CompanyId, CompanySummary, Document, DocumentId, DocumentKind, DocumentSummary,
};
use taxrisk_core::{RepositoryError, RiskLevel, RiskRepository};

// --- Journal event --------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LedgerEvent {
    CompanyAdded {
        company: Company,
    },
    CompanyDeleted {
        company_id: CompanyId,
    },
    CompanyTotalsUpdated {
        company_id: CompanyId,
        revenue: f64,
        expenses: f64,
    },
    CompanyRiskUpdated {
        company_id: CompanyId,
        score: f64,
        level: RiskLevel,
    },
    DocumentAdded {
        document: Document,
    },
    DocumentSuspiciousMarked {
        document_id: DocumentId,
        suspicious: bool,
    },
    DocumentReportedSet {
        document_id: DocumentId,
        reported: bool,
    },
}

// --- Append error ---------------------------------------------------------

/// Error returned when a ledger mutation is rejected or cannot be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerAppendError {
    UnknownCompany(CompanyId),
    UnknownDocument(DocumentId),
    DuplicateTaxNumber(String),
    InvalidDocument { reason: String },
    InvalidTotals { reason: String },
    WriteFailed { reason: String },
}

impl std::fmt::Display for LedgerAppendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCompany(id) => write!(f, "company not found: {id}"),
            Self::UnknownDocument(id) => write!(f, "document not found: {id}"),
            Self::DuplicateTaxNumber(tax) => write!(f, "tax number already registered: {tax}"),
            Self::InvalidDocument { reason } => write!(f, "invalid document: {reason}"),
            Self::InvalidTotals { reason } => write!(f, "invalid company totals: {reason}"),
            Self::WriteFailed { reason } => write!(f, "ledger write failed: {reason}"),
        }
    }
}

impl std::error::Error for LedgerAppendError {}

// --- Metrics --------------------------------------------------------------

/// Observability counters for the ledger.
#[derive(Debug, Default)]
pub struct LedgerMetrics {
    appends_total: u64,
    write_errors: u64,
    skipped_unchanged_total: u64,
}

impl LedgerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events appended (and applied) since the ledger was opened.
    pub fn appends_total(&self) -> u64 {
        self.appends_total
    }

    /// Rejected or failed mutations.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    /// Risk/flag writes that matched the stored value and were not journaled.
    pub fn skipped_unchanged_total(&self) -> u64 {
        self.skipped_unchanged_total
    }

    fn record_append(&mut self) {
        self.appends_total += 1;
    }

    fn record_write_error(&mut self) {
        self.write_errors += 1;
    }

    fn record_skip(&mut self) {
        self.skipped_unchanged_total += 1;
    }
}

// --- New document ---------------------------------------------------------

/// Fields supplied by the collaborator that files a document.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub company_id: CompanyId,
    pub kind: DocumentKind,
    pub amount: f64,
    pub reported: bool,
    pub vendor: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
}

// --- Ledger ---------------------------------------------------------------

/// First id handed out for companies and documents.
const FIRST_ID: u64 = 1;

/// Repository of companies and documents with an optional JSONL journal.
#[derive(Debug)]
pub struct LedgerRepository {
    companies: BTreeMap<CompanyId, Company>,
    documents: BTreeMap<DocumentId, Document>,
    next_company_id: CompanyId,
    next_document_id: DocumentId,
    storage_path: Option<PathBuf>,
    metrics: LedgerMetrics,
}

impl Default for LedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerRepository {
    /// Create an empty in-memory ledger.
    pub fn new() -> Self {
        Self {
            companies: BTreeMap::new(),
            documents: BTreeMap::new(),
            next_company_id: FIRST_ID,
            next_document_id: FIRST_ID,
            storage_path: None,
            metrics: LedgerMetrics::new(),
        }
    }

    /// Create/load a ledger backed by a JSONL journal file.
    pub fn with_storage_path(storage_path: impl AsRef<Path>) -> io::Result<Self> {
        let path = storage_path.as_ref().to_path_buf();
        let events = read_events_from_path(&path)?;
        let mut ledger = Self::new();
        for event in &events {
            ledger
                .apply_event(event)
                .map_err(|reason| io::Error::new(io::ErrorKind::InvalidData, reason))?;
        }
        tracing::debug!(
            "Ledger replayed events={} companies={} documents={} path={}",
            events.len(),
            ledger.companies.len(),
            ledger.documents.len(),
            path.display()
        );
        ledger.storage_path = Some(path);
        Ok(ledger)
    }

    /// Storage path if this ledger is durable.
    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    pub fn company(&self, company_id: CompanyId) -> Option<&Company> {
        self.companies.get(&company_id)
    }

    /// Live companies in id order.
    pub fn companies(&self) -> impl Iterator<Item = &Company> {
        self.companies.values()
    }

    pub fn document(&self, document_id: DocumentId) -> Option<&Document> {
        self.documents.get(&document_id)
    }

    /// Documents of `company_id`, ordered by date then id.
    pub fn documents_of(&self, company_id: CompanyId) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self
            .documents
            .values()
            .filter(|d| d.company_id == company_id)
            .collect();
        docs.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        docs
    }

    /// Register a company with zero totals. Returns its new id.
    pub fn add_company(
        &mut self,
        name: impl Into<String>,
        tax_number: impl Into<String>,
    ) -> Result<CompanyId, LedgerAppendError> {
        let tax_number = tax_number.into();
        if self.companies.values().any(|c| c.tax_number == tax_number) {
            self.metrics.record_write_error();
            return Err(LedgerAppendError::DuplicateTaxNumber(tax_number));
        }
        let company = Company::new(self.next_company_id, name, tax_number);
        let id = company.id;
        self.persist_and_apply(LedgerEvent::CompanyAdded { company })?;
        Ok(id)
    }

    /// Remove a company and every document it owns.
    pub fn delete_company(&mut self, company_id: CompanyId) -> Result<(), LedgerAppendError> {
        self.require_company(company_id)?;
        self.persist_and_apply(LedgerEvent::CompanyDeleted { company_id })
    }

    /// File a document. Totals are not touched; see [`Self::recompute_company_totals`].
    pub fn add_document(&mut self, new: NewDocument) -> Result<DocumentId, LedgerAppendError> {
        self.require_company(new.company_id)?;
        if !new.amount.is_finite() || new.amount <= 0.0 {
            self.metrics.record_write_error();
            return Err(LedgerAppendError::InvalidDocument {
                reason: format!("amount must be positive and finite, got {}", new.amount),
            });
        }
        let document = Document {
            id: self.next_document_id,
            company_id: new.company_id,
            kind: new.kind,
            amount: new.amount,
            reported: new.reported,
            vendor: new.vendor,
            date: new.date,
            suspicious: false,
        };
        let id = document.id;
        self.persist_and_apply(LedgerEvent::DocumentAdded { document })?;
        Ok(id)
    }

    /// Toggle whether a document was reported to the tax authority.
    pub fn set_document_reported(
        &mut self,
        document_id: DocumentId,
        reported: bool,
    ) -> Result<(), LedgerAppendError> {
        self.require_document(document_id)?;
        self.persist_and_apply(LedgerEvent::DocumentReportedSet {
            document_id,
            reported,
        })
    }

    /// Overwrite a company's revenue/expenses. Both must be finite and non-negative.
    pub fn update_company_totals(
        &mut self,
        company_id: CompanyId,
        revenue: f64,
        expenses: f64,
    ) -> Result<(), LedgerAppendError> {
        self.require_company(company_id)?;
        for (name, value) in [("revenue", revenue), ("expenses", expenses)] {
            if !value.is_finite() || value < 0.0 {
                self.metrics.record_write_error();
                return Err(LedgerAppendError::InvalidTotals {
                    reason: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
        }
        self.persist_and_apply(LedgerEvent::CompanyTotalsUpdated {
            company_id,
            revenue,
            expenses,
        })
    }

    /// Set a company's revenue/expenses to its income/outflow document sums.
    pub fn recompute_company_totals(
        &mut self,
        company_id: CompanyId,
    ) -> Result<(f64, f64), LedgerAppendError> {
        self.require_company(company_id)?;
        let summaries: Vec<DocumentSummary> = self
            .documents_of(company_id)
            .into_iter()
            .map(Document::summary)
            .collect();
        let (revenue, expenses) = company_totals(&summaries);
        self.update_company_totals(company_id, revenue, expenses)?;
        Ok((revenue, expenses))
    }

    fn require_company(&mut self, company_id: CompanyId) -> Result<(), LedgerAppendError> {
        if self.companies.contains_key(&company_id) {
            return Ok(());
        }
        self.metrics.record_write_error();
        Err(LedgerAppendError::UnknownCompany(company_id))
    }

    fn require_document(&mut self, document_id: DocumentId) -> Result<(), LedgerAppendError> {
        if self.documents.contains_key(&document_id) {
            return Ok(());
        }
        self.metrics.record_write_error();
        Err(LedgerAppendError::UnknownDocument(document_id))
    }

    fn persist_and_apply(&mut self, event: LedgerEvent) -> Result<(), LedgerAppendError> {
        if let Some(path) = &self.storage_path {
            if let Err(reason) = write_event_to_path(path, &event) {
                self.metrics.record_write_error();
                tracing::warn!("Ledger journal write failed: {}", reason);
                return Err(LedgerAppendError::WriteFailed { reason });
            }
        }

        if let Err(reason) = self.apply_event(&event) {
            self.metrics.record_write_error();
            return Err(LedgerAppendError::WriteFailed { reason });
        }

        self.metrics.record_append();
        Ok(())
    }

    fn apply_event(&mut self, event: &LedgerEvent) -> Result<(), String> {
        match event {
            LedgerEvent::CompanyAdded { company } => {
                self.next_company_id = self.next_company_id.max(company.id + 1);
                self.companies.insert(company.id, company.clone());
                Ok(())
            }
            LedgerEvent::CompanyDeleted { company_id } => {
                self.companies
                    .remove(company_id)
                    .ok_or_else(|| format!("delete missing company_id: {company_id}"))?;
                self.documents.retain(|_, d| d.company_id != *company_id);
                Ok(())
            }
            LedgerEvent::CompanyTotalsUpdated {
                company_id,
                revenue,
                expenses,
            } => {
                let company = self.company_mut(*company_id)?;
                company.revenue = *revenue;
                company.expenses = *expenses;
                Ok(())
            }
            LedgerEvent::CompanyRiskUpdated {
                company_id,
                score,
                level,
            } => {
                let company = self.company_mut(*company_id)?;
                company.risk_score = *score;
                company.risk_level = *level;
                Ok(())
            }
            LedgerEvent::DocumentAdded { document } => {
                if !self.companies.contains_key(&document.company_id) {
                    return Err(format!(
                        "document {} references missing company_id: {}",
                        document.id, document.company_id
                    ));
                }
                self.next_document_id = self.next_document_id.max(document.id + 1);
                self.documents.insert(document.id, document.clone());
                Ok(())
            }
            LedgerEvent::DocumentSuspiciousMarked {
                document_id,
                suspicious,
            } => {
                self.document_mut(*document_id)?.suspicious = *suspicious;
                Ok(())
            }
            LedgerEvent::DocumentReportedSet {
                document_id,
                reported,
            } => {
                self.document_mut(*document_id)?.reported = *reported;
                Ok(())
            }
        }
    }

    fn company_mut(&mut self, company_id: CompanyId) -> Result<&mut Company, String> {
        self.companies
            .get_mut(&company_id)
            .ok_or_else(|| format!("event references missing company_id: {company_id}"))
    }

    fn document_mut(&mut self, document_id: DocumentId) -> Result<&mut Document, String> {
        self.documents
            .get_mut(&document_id)
            .ok_or_else(|| format!("event references missing document_id: {document_id}"))
    }
}

impl RiskRepository for LedgerRepository {
    fn list_companies(&self) -> Result<Vec<CompanySummary>, RepositoryError> {
        Ok(self.companies.values().map(Company::summary).collect())
    }

    fn list_documents(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<DocumentSummary>, RepositoryError> {
        if !self.companies.contains_key(&company_id) {
            return Err(RepositoryError::new(
                "list_documents",
                LedgerAppendError::UnknownCompany(company_id).to_string(),
            ));
        }
        Ok(self
            .documents_of(company_id)
            .into_iter()
            .map(Document::summary)
            .collect())
    }

    fn update_company_risk(
        &mut self,
        company_id: CompanyId,
        score: f64,
        level: RiskLevel,
    ) -> Result<(), RepositoryError> {
        let to_repo_err =
            |e: LedgerAppendError| RepositoryError::new("update_company_risk", e.to_string());
        self.require_company(company_id).map_err(to_repo_err)?;
        if let Some(c) = self.companies.get(&company_id) {
            if c.risk_score.to_bits() == score.to_bits() && c.risk_level == level {
                self.metrics.record_skip();
                return Ok(());
            }
        }
        self.persist_and_apply(LedgerEvent::CompanyRiskUpdated {
            company_id,
            score,
            level,
        })
        .map_err(to_repo_err)
    }

    fn mark_document_suspicious(
        &mut self,
        document_id: DocumentId,
        suspicious: bool,
    ) -> Result<(), RepositoryError> {
        let to_repo_err =
            |e: LedgerAppendError| RepositoryError::new("mark_document_suspicious", e.to_string());
        self.require_document(document_id).map_err(to_repo_err)?;
        if self.documents.get(&document_id).map(|d| d.suspicious) == Some(suspicious) {
            self.metrics.record_skip();
            return Ok(());
        }
        self.persist_and_apply(LedgerEvent::DocumentSuspiciousMarked {
            document_id,
            suspicious,
        })
        .map_err(to_repo_err)
    }
}

// --- Journal I/O ----------------------------------------------------------

fn write_event_to_path(path: &Path, event: &LedgerEvent) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "failed to create journal parent directory {}: {e}",
                parent.display()
            )
        })?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("failed to open journal {}: {e}", path.display()))?;
    let mut line = serde_json::to_string(event)
        .map_err(|e| format!("failed to encode journal event: {e}"))?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .map_err(|e| format!("failed to write journal event {}: {e}", path.display()))?;
    file.flush()
        .map_err(|e| format!("failed to flush journal {}: {e}", path.display()))
}

fn read_events_from_path(path: &Path) -> io::Result<Vec<LedgerEvent>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: LedgerEvent = serde_json::from_str(trimmed).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "invalid journal event at line {} in {}: {e}",
                    index + 1,
                    path.display()
                ),
            )
        })?;
        events.push(event);
    }

    Ok(events)
}
