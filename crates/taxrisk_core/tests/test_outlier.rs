use taxrisk_core::model::DocumentKind;
use taxrisk_core::outlier::{
    MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD, flag_outliers, mark_company_outliers,
    robust_z_scores,
};

mod common;
use common::{FakeRepo, doc, uniform_docs};

#[test]
fn test_robust_z_scores_known_values() {
    // median 3, deviations [2, 1, 0, 1, 97], MAD 1
    let z = robust_z_scores(&[1.0, 2.0, 3.0, 4.0, 100.0], MAD_NORMAL_SCALE);
    assert_eq!(z.len(), 5);
    assert!((z[0] - 2.0 / MAD_NORMAL_SCALE).abs() < 1e-12);
    assert_eq!(z[2], 0.0);
    assert!((z[4] - 97.0 / MAD_NORMAL_SCALE).abs() < 1e-9);
}

#[test]
fn test_only_extreme_amount_is_flagged() {
    let flags = flag_outliers(
        &[1.0, 2.0, 3.0, 4.0, 100.0],
        MAD_NORMAL_SCALE,
        SUSPICIOUS_Z_THRESHOLD,
    );
    assert_eq!(flags, vec![false, false, false, false, true]);
}

#[test]
fn test_identical_amounts_never_flag() {
    let z = robust_z_scores(&[250.0; 6], MAD_NORMAL_SCALE);
    assert!(z.iter().all(|&v| v == 0.0));
}

#[test]
fn test_zero_mad_substitutes_unit_spread() {
    // MAD of [100 x9, 10000] is 0, so the outlier's z is 9900 / 1.4826
    let mut amounts = vec![100.0; 9];
    amounts.push(10_000.0);
    let z = robust_z_scores(&amounts, MAD_NORMAL_SCALE);
    assert!((z[9] - 9900.0 / MAD_NORMAL_SCALE).abs() < 1e-9);
    assert_eq!(z[0], 0.0);
}

#[test]
fn test_single_document_never_suspicious() {
    for amount in [0.01, 1.0, 1e9] {
        let z = robust_z_scores(&[amount], MAD_NORMAL_SCALE);
        assert_eq!(z, vec![0.0]);
    }

    let mut repo = FakeRepo::new();
    let docs = vec![doc(1, DocumentKind::Outflow, 1e9, false)];
    let tally =
        mark_company_outliers(&mut repo, &docs, MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD).unwrap();
    assert_eq!(tally.suspicious(), 0);
    assert_eq!(tally.examined(), 1);
    assert_eq!(repo.flag(1), Some(false));
}

#[test]
fn test_threshold_is_strict() {
    // z exactly at the threshold is not suspicious
    let amounts = [0.0, 0.0, 1.0, 2.0, 2.0];
    let z = robust_z_scores(&amounts, 1.0);
    // median 1, deviations [1, 1, 0, 1, 1], MAD 1
    assert_eq!(z, vec![1.0, 1.0, 0.0, 1.0, 1.0]);
    assert_eq!(flag_outliers(&amounts, 1.0, 1.0), vec![false; 5]);
}

#[test]
fn test_mark_company_outliers_writes_every_document_once() {
    let mut repo = FakeRepo::new();
    let mut docs = uniform_docs(1, 9, 100.0, true);
    docs.push(doc(10, DocumentKind::Income, 10_000.0, true));

    let tally =
        mark_company_outliers(&mut repo, &docs, MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD).unwrap();
    assert_eq!(repo.flag_writes(), 10);
    assert_eq!(repo.flag(10), Some(true));
    assert!((1..=9).all(|id| repo.flag(id) == Some(false)));
    assert_eq!(tally.examined(), 10);
    assert_eq!(tally.suspicious(), 1);
    assert!((tally.ratio() - 0.1).abs() < 1e-12);
}

#[test]
fn test_empty_company_is_noop() {
    let mut repo = FakeRepo::new();
    let tally =
        mark_company_outliers(&mut repo, &[], MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD).unwrap();
    assert_eq!(tally.examined(), 0);
    assert_eq!(tally.ratio(), 0.0);
    assert_eq!(repo.flag_writes(), 0);
}

#[test]
fn test_write_failure_propagates() {
    let mut repo = FakeRepo::new();
    repo.fail = Some(("mark_document_suspicious", 1));
    let docs = uniform_docs(1, 3, 100.0, true);
    let err = mark_company_outliers(&mut repo, &docs, MAD_NORMAL_SCALE, SUSPICIOUS_Z_THRESHOLD)
        .unwrap_err();
    assert_eq!(err.operation, "mark_document_suspicious");
    assert_eq!(repo.flag_writes(), 1);
}
