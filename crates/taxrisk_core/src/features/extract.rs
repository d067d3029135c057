//! Feature vector derived from one company's documents.
//!
//! Every ratio goes through [`safe_div`], so an empty ledger produces a
//! vector of zeros (apart from the company's own revenue/expenses) instead
//! of NaN.

use crate::model::{CompanySummary, DocumentKind, DocumentSummary};
use crate::numeric::safe_div;

/// Number of columns in a [`FeatureRow`].
pub const FEATURE_COUNT: usize = 7;

/// Feature vector flattened in column order, as consumed by the forest.
pub type FeatureRow = [f64; FEATURE_COUNT];

/// Run-scoped features of one company. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub revenue: f64,
    pub expenses: f64,
    pub num_docs: f64,
    pub avg_amount: f64,
    /// Income amount over income + outflow amount.
    pub income_ratio: f64,
    /// `(revenue - expenses) / max(1, revenue)`.
    pub profit_margin: f64,
    /// Reported documents over `max(1, num_docs)`.
    pub reported_ratio: f64,
}

impl FeatureVector {
    pub fn as_row(&self) -> FeatureRow {
        [
            self.revenue,
            self.expenses,
            self.num_docs,
            self.avg_amount,
            self.income_ratio,
            self.profit_margin,
            self.reported_ratio,
        ]
    }
}

/// Derive the feature vector of `company` from its `documents`.
///
/// Revenue and expenses come from the company record as listed, not from the
/// documents. Pure function; document order is irrelevant.
pub fn extract_features(company: &CompanySummary, documents: &[DocumentSummary]) -> FeatureVector {
    let num_docs = documents.len();
    let (income_amt, outflow_amt) = company_totals(documents);
    let total_amt: f64 = documents.iter().map(|d| d.amount).sum();
    let reported_count = documents.iter().filter(|d| d.reported).count();

    FeatureVector {
        revenue: company.revenue,
        expenses: company.expenses,
        num_docs: num_docs as f64,
        avg_amount: safe_div(total_amt, num_docs.max(1) as f64),
        income_ratio: safe_div(income_amt, income_amt + outflow_amt),
        profit_margin: safe_div(company.revenue - company.expenses, company.revenue.max(1.0)),
        reported_ratio: safe_div(reported_count as f64, num_docs.max(1) as f64),
    }
}

/// `(income total, outflow total)` over `documents`.
///
/// These are the cumulative revenue/expenses a repository stores on the
/// company when it recomputes totals.
pub fn company_totals(documents: &[DocumentSummary]) -> (f64, f64) {
    documents
        .iter()
        .fold((0.0, 0.0), |(income, outflow), d| match d.kind {
            DocumentKind::Income => (income + d.amount, outflow),
            DocumentKind::Outflow => (income, outflow + d.amount),
        })
}
