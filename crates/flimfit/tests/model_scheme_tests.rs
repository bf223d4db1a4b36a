//! Tests for the decay-model parameter scheme.
//!
//! These tests verify the mapping from model selectors to parameter counts,
//! the fixed-fraction derivation of initial parameter vectors from a rapid
//! estimate, and the model evaluation functions.
//!
//! ## Test Organization
//!
//! 1. **Selectors** - Integer selector round-trips and rejection
//! 2. **Parameter Counts** - `p` per model
//! 3. **Initial Parameters** - Exact fixed-fraction derivation
//! 4. **Evaluation** - Model values and analytic derivatives

use approx::assert_relative_eq;
use flimfit::prelude::*;

// ============================================================================
// Selector Tests
// ============================================================================

/// Test that selectors 1-4 resolve and round-trip.
#[test]
fn test_selector_round_trip() {
    for selector in 1..=4 {
        let model = DecayModel::from_selector(selector).unwrap();
        assert_eq!(model.selector(), selector);
    }
}

/// Test that out-of-range model selectors are rejected.
#[test]
fn test_invalid_selector_rejected() {
    assert!(matches!(
        DecayModel::from_selector(0),
        Err(FlimError::InvalidSelector {
            field: "model",
            got: 0
        })
    ));
    assert!(DecayModel::from_selector(5).is_err());
    assert!(DecayModel::from_selector(-1).is_err());
}

/// Test noise-model selectors 0-5 and the default.
#[test]
fn test_noise_selectors() {
    for selector in 0..=5 {
        let noise = NoiseModel::from_selector(selector).unwrap();
        assert_eq!(noise.selector(), selector);
    }
    assert!(NoiseModel::from_selector(6).is_err());
    assert_eq!(NoiseModel::default(), NoiseModel::GaussianFit);
}

// ============================================================================
// Parameter Count Tests
// ============================================================================

/// Test the parameter count table: 3, 5, 7, 4.
#[test]
fn test_param_counts() {
    assert_eq!(DecayModel::SingleExp.param_count(), 3);
    assert_eq!(DecayModel::DoubleExp.param_count(), 5);
    assert_eq!(DecayModel::TripleExp.param_count(), 7);
    assert_eq!(DecayModel::StretchedExp.param_count(), 4);
}

// ============================================================================
// Initial Parameter Tests
// ============================================================================

/// Test single-exponential seeding: the rapid triple passes through.
#[test]
fn test_initial_params_single() {
    let params = DecayModel::SingleExp.initial_params(5.0_f32, 1000.0, 2.0);
    assert_eq!(params, vec![5.0, 1000.0, 2.0]);
}

/// Test double-exponential seeding from (z=0, a=1000, tau=2).
///
/// The fixed fractions must reproduce [0, 750, 2, 250, 1.3333334] exactly.
#[test]
fn test_initial_params_double() {
    let params = DecayModel::DoubleExp.initial_params(0.0_f32, 1000.0, 2.0);
    assert_eq!(params.len(), 5);
    assert_relative_eq!(params[0], 0.0);
    assert_relative_eq!(params[1], 750.0);
    assert_relative_eq!(params[2], 2.0);
    assert_relative_eq!(params[3], 250.0);
    assert_relative_eq!(params[4], 1.3333334, max_relative = 1e-6);
}

/// Test triple-exponential seeding from (z=0, a=1000, tau=2).
#[test]
fn test_initial_params_triple() {
    let params = DecayModel::TripleExp.initial_params(0.0_f32, 1000.0, 2.0);
    assert_eq!(params.len(), 7);
    assert_relative_eq!(params[0], 0.0);
    assert_relative_eq!(params[1], 750.0);
    assert_relative_eq!(params[2], 2.0);
    assert_relative_eq!(params[3], 166.6667, max_relative = 1e-6);
    assert_relative_eq!(params[4], 1.3333334, max_relative = 1e-6);
    assert_relative_eq!(params[5], 166.6667, max_relative = 1e-6);
    assert_relative_eq!(params[6], 0.6666666, max_relative = 1e-6);
}

/// Test stretched-exponential seeding: fixed stretch seed 1.5.
#[test]
fn test_initial_params_stretched() {
    let params = DecayModel::StretchedExp.initial_params(3.0_f32, 900.0, 1.5);
    assert_eq!(params, vec![3.0, 900.0, 1.5, 1.5]);
}

// ============================================================================
// Evaluation Tests
// ============================================================================

/// Test single-exponential evaluation at a few points.
#[test]
fn test_evaluate_single() {
    let params = [10.0_f64, 1000.0, 2.0];
    assert_relative_eq!(DecayModel::SingleExp.evaluate(0.0, &params), 1010.0);
    assert_relative_eq!(
        DecayModel::SingleExp.evaluate(2.0, &params),
        10.0 + 1000.0 * (-1.0_f64).exp(),
        max_relative = 1e-12
    );
}

/// Test that a double-exponential value is the sum of its components.
#[test]
fn test_evaluate_double() {
    let params = [5.0_f64, 700.0, 2.0, 300.0, 0.5];
    let t = 1.25;
    let expected = 5.0 + 700.0 * (-t / 2.0_f64).exp() + 300.0 * (-t / 0.5_f64).exp();
    assert_relative_eq!(
        DecayModel::DoubleExp.evaluate(t, &params),
        expected,
        max_relative = 1e-12
    );
}

/// Test stretched-exponential evaluation, including the window origin.
#[test]
fn test_evaluate_stretched() {
    let params = [10.0_f64, 1000.0, 2.0, 1.5];
    // At t = 0 the stretched term is 1.
    assert_relative_eq!(DecayModel::StretchedExp.evaluate(0.0, &params), 1010.0);
    let t = 1.0_f64;
    let u = (t / 2.0_f64).powf(1.0 / 1.5);
    assert_relative_eq!(
        DecayModel::StretchedExp.evaluate(t, &params),
        10.0 + 1000.0 * (-u).exp(),
        max_relative = 1e-12
    );
}

/// Test analytic derivatives against central finite differences.
#[test]
fn test_derivatives_match_finite_differences() {
    let models: [(DecayModel, Vec<f64>); 3] = [
        (DecayModel::SingleExp, vec![10.0, 1000.0, 2.0]),
        (DecayModel::DoubleExp, vec![5.0, 700.0, 2.0, 300.0, 0.5]),
        (DecayModel::StretchedExp, vec![10.0, 1000.0, 2.0, 1.5]),
    ];
    let t = 0.8_f64;
    let h = 1e-6;

    for (model, params) in models {
        let mut dyda = vec![0.0; params.len()];
        let value = model.evaluate_with_derivs(t, &params, &mut dyda);
        assert_relative_eq!(value, model.evaluate(t, &params), max_relative = 1e-12);

        for j in 0..params.len() {
            let mut up = params.clone();
            let mut down = params.clone();
            let scale = params[j].abs().max(1.0);
            up[j] += h * scale;
            down[j] -= h * scale;
            let numeric =
                (model.evaluate(t, &up) - model.evaluate(t, &down)) / (2.0 * h * scale);
            assert_relative_eq!(dyda[j], numeric, max_relative = 1e-4, epsilon = 1e-6);
        }
    }
}
