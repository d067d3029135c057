#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use taxrisk_core::model::{CompanyId, DocumentId, DocumentKind};
use taxrisk_infra::store::{LedgerRepository, NewDocument};

pub fn temp_journal_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "taxrisk_ledger_{tag}_{}_{}.jsonl",
        std::process::id(),
        nanos
    ))
}

pub fn remove_if_exists(path: &Path) {
    let _ = std::fs::remove_file(path);
}

pub fn journal_line_count(path: &Path) -> usize {
    std::fs::read_to_string(path)
        .expect("read journal")
        .lines()
        .filter(|l| !l.trim().is_empty())
        .count()
}

pub fn income(company_id: CompanyId, amount: f64, day: u32) -> NewDocument {
    NewDocument {
        company_id,
        kind: DocumentKind::Income,
        amount,
        reported: true,
        vendor: None,
        date: format!("2024-03-{day:02}"),
    }
}

/// Company with `amounts` filed as reported income, one per day, totals recomputed.
pub fn add_filed_company(
    ledger: &mut LedgerRepository,
    tax_number: &str,
    amounts: &[f64],
) -> (CompanyId, Vec<DocumentId>) {
    let id = ledger
        .add_company(format!("Company {tax_number}"), tax_number)
        .expect("add company");
    let docs = amounts
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            ledger
                .add_document(income(id, amount, i as u32 + 1))
                .expect("add document")
        })
        .collect();
    ledger.recompute_company_totals(id).expect("recompute totals");
    (id, docs)
}

/// Eight companies with ten filings of 100 each, plus one whose last filing
/// is 10000. Returns (peer ids, outlier company id, outlier document id).
pub fn peer_batch_with_outlier(
    ledger: &mut LedgerRepository,
) -> (Vec<CompanyId>, CompanyId, DocumentId) {
    let peers = (0..8)
        .map(|i| add_filed_company(ledger, &format!("TX-PEER-{i}"), &[100.0; 10]).0)
        .collect();
    let mut amounts = vec![100.0; 9];
    amounts.push(10_000.0);
    let (outlier, docs) = add_filed_company(ledger, "TX-OUTLIER", &amounts);
    (peers, outlier, docs[9])
}
