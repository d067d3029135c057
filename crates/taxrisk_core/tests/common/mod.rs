#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use taxrisk_core::features::company_totals;
use taxrisk_core::model::{CompanyId, CompanySummary, DocumentId, DocumentKind, DocumentSummary};
use taxrisk_core::{RepositoryError, RiskLevel, RiskRepository};

/// Test helper: document summary with the given fields.
pub fn doc(id: DocumentId, kind: DocumentKind, amount: f64, reported: bool) -> DocumentSummary {
    DocumentSummary {
        id,
        kind,
        amount,
        reported,
    }
}

/// Test helper: `count` income documents of `amount`, ids from `first_id`.
pub fn uniform_docs(
    first_id: DocumentId,
    count: u64,
    amount: f64,
    reported: bool,
) -> Vec<DocumentSummary> {
    (0..count)
        .map(|i| doc(first_id + i, DocumentKind::Income, amount, reported))
        .collect()
}

/// Write observed by the fake, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Flag(DocumentId, bool),
    Risk(CompanyId, f64, RiskLevel),
}

/// In-memory repository that records every write and can fail on demand.
#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    companies: Vec<CompanySummary>,
    documents: BTreeMap<CompanyId, Vec<DocumentSummary>>,
    pub writes: Vec<Write>,
    calls: RefCell<BTreeMap<&'static str, usize>>,
    /// Fail the n-th (0-based) call of the named operation.
    pub fail: Option<(&'static str, usize)>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a company whose totals are derived from its documents.
    pub fn add_company(&mut self, id: CompanyId, docs: Vec<DocumentSummary>) {
        let (revenue, expenses) = company_totals(&docs);
        self.add_company_with_totals(id, revenue, expenses, docs);
    }

    pub fn add_company_with_totals(
        &mut self,
        id: CompanyId,
        revenue: f64,
        expenses: f64,
        docs: Vec<DocumentSummary>,
    ) {
        self.companies.push(CompanySummary {
            id,
            revenue,
            expenses,
        });
        self.documents.insert(id, docs);
    }

    pub fn calls(&self, operation: &'static str) -> usize {
        self.calls.borrow().get(operation).copied().unwrap_or(0)
    }

    /// Last suspicious flag written for `doc_id`.
    pub fn flag(&self, doc_id: DocumentId) -> Option<bool> {
        self.writes.iter().rev().find_map(|w| match w {
            Write::Flag(id, s) if *id == doc_id => Some(*s),
            _ => None,
        })
    }

    /// Last risk fields written for `company_id`.
    pub fn risk(&self, company_id: CompanyId) -> Option<(f64, RiskLevel)> {
        self.writes.iter().rev().find_map(|w| match w {
            Write::Risk(id, score, level) if *id == company_id => Some((*score, *level)),
            _ => None,
        })
    }

    pub fn flag_writes(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, Write::Flag(..)))
            .count()
    }

    pub fn risk_writes(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, Write::Risk(..)))
            .count()
    }

    fn enter(&self, operation: &'static str) -> Result<(), RepositoryError> {
        let mut calls = self.calls.borrow_mut();
        let n = calls.entry(operation).or_insert(0);
        let current = *n;
        *n += 1;
        match self.fail {
            Some((op, at)) if op == operation && at == current => {
                Err(RepositoryError::new(operation, "injected failure"))
            }
            _ => Ok(()),
        }
    }
}

impl RiskRepository for FakeRepo {
    fn list_companies(&self) -> Result<Vec<CompanySummary>, RepositoryError> {
        self.enter("list_companies")?;
        Ok(self.companies.clone())
    }

    fn list_documents(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<DocumentSummary>, RepositoryError> {
        self.enter("list_documents")?;
        Ok(self.documents.get(&company_id).cloned().unwrap_or_default())
    }

    fn update_company_risk(
        &mut self,
        company_id: CompanyId,
        score: f64,
        level: RiskLevel,
    ) -> Result<(), RepositoryError> {
        self.enter("update_company_risk")?;
        self.writes.push(Write::Risk(company_id, score, level));
        Ok(())
    }

    fn mark_document_suspicious(
        &mut self,
        document_id: DocumentId,
        suspicious: bool,
    ) -> Result<(), RepositoryError> {
        self.enter("mark_document_suspicious")?;
        self.writes.push(Write::Flag(document_id, suspicious));
        Ok(())
    }
}

/// A dozen companies with varied ledgers, generated deterministically.
pub fn mixed_population() -> FakeRepo {
    let mut repo = FakeRepo::new();
    let mut next_doc: DocumentId = 1;
    for company in 0..12u64 {
        let mut docs = Vec::new();
        let count = 5 + (company % 4) * 3;
        for i in 0..count {
            let kind = if (i + company) % 3 == 0 {
                DocumentKind::Outflow
            } else {
                DocumentKind::Income
            };
            let mut amount = 150.0 + ((company * 37 + i * 53) % 400) as f64;
            if company == 7 && i == 2 {
                amount = 25_000.0;
            }
            let reported = (i + company) % 5 != 0;
            docs.push(doc(next_doc, kind, amount, reported));
            next_doc += 1;
        }
        repo.add_company(100 + company, docs);
    }
    repo
}
