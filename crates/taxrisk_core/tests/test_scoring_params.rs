use taxrisk_core::ScoringParams;
use taxrisk_core::risk::{ScoreWeights, compose_score};

#[test]
fn test_reference_params_are_valid() {
    let params = ScoringParams::default();
    assert!(params.validate().is_ok());
    assert_eq!(params.tree_count, 200);
    assert_eq!(params.max_samples, 256);
    assert_eq!(params.suspicious_z_threshold, 3.5);
    assert_eq!(params.mad_scale, 1.4826);
    assert_eq!(
        params.weights,
        ScoreWeights {
            anomaly: 0.60,
            reported: 0.25,
            suspicious: 0.15,
        }
    );
}

#[test]
fn test_zero_trees_rejected() {
    let params = ScoringParams {
        tree_count: 0,
        ..ScoringParams::default()
    };
    let err = params.validate().unwrap_err();
    assert_eq!(err.param, "tree_count");
    assert!(err.to_string().contains("tree_count"));
}

#[test]
fn test_inverted_floors_rejected() {
    let params = ScoringParams {
        risky_floor: 70.0,
        high_floor: 60.0,
        ..ScoringParams::default()
    };
    assert_eq!(params.validate().unwrap_err().param, "high_floor");
}

#[test]
fn test_non_finite_weight_rejected() {
    let params = ScoringParams {
        weights: ScoreWeights {
            reported: f64::NAN,
            ..ScoreWeights::default()
        },
        ..ScoringParams::default()
    };
    assert_eq!(params.validate().unwrap_err().param, "reported_weight");
}

#[test]
fn test_contamination_out_of_range_rejected() {
    let params = ScoringParams {
        contamination: 0.9,
        ..ScoringParams::default()
    };
    assert_eq!(params.validate().unwrap_err().param, "contamination");
}

#[test]
fn test_compose_score_components() {
    let w = ScoreWeights::default();
    assert_eq!(compose_score(0.0, 0.0, 0.0, &w), 0.0);
    assert!((compose_score(0.0, 1.0, 0.0, &w) - 25.0).abs() < 1e-9);
    assert!((compose_score(1.0, 0.0, 0.0, &w) - 60.0).abs() < 1e-9);
    assert!((compose_score(0.0, 0.0, 1.0, &w) - 15.0).abs() < 1e-9);
    assert!((compose_score(1.0, 1.0, 1.0, &w) - 100.0).abs() < 1e-9);
}
