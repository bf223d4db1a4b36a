//! Tests for the two-stage fit executor and result assembly.
//!
//! These tests exercise the public batch API end to end on small synthetic
//! batches, checking output shapes, broadcast semantics, status reporting,
//! and the goodness-of-fit arithmetic.
//!
//! ## Test Organization
//!
//! 1. **Output Shapes** - Table dimensions per model and request flags
//! 2. **Broadcast Semantics** - Shared vs. per-transient inputs
//! 3. **Statuses** - Per-transient outcomes, failure tolerance
//! 4. **Goodness of Fit** - Reduced chi-square arithmetic

use approx::assert_relative_eq;
use flimfit::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

const N_BINS: usize = 64;
const DT: f32 = 0.05;

/// Identity prompt: convolution with [1, 0] leaves curves unchanged.
fn identity_prompt() -> Vec<f32> {
    vec![1.0, 0.0]
}

/// Clean single-exponential transient over the full bin range.
fn decay_curve(z: f32, a: f32, tau: f32) -> Vec<f32> {
    (0..N_BINS)
        .map(|i| z + a * (-(i as f32) * DT / tau).exp())
        .collect()
}

fn fitter(model: DecayModel) -> FlimFitter<f32> {
    FlimFit::new()
        .model(model)
        .return_rapid_params()
        .return_fitted()
        .return_rapid_fitted()
        .build()
        .unwrap()
}

// ============================================================================
// Output Shape Tests
// ============================================================================

/// Test that the refined table has `p + 1` rows for every model.
#[test]
fn test_refined_table_rows_per_model() {
    let transient = decay_curve(10.0, 1000.0, 2.0);
    let prompt = identity_prompt();
    let transients = CurveMatrix::from_flat(&transient, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    for (model, p) in [
        (DecayModel::SingleExp, 3),
        (DecayModel::DoubleExp, 5),
        (DecayModel::TripleExp, 7),
        (DecayModel::StretchedExp, 4),
    ] {
        let output = fitter(model)
            .fit(&transients, &prompts, &[DT], None)
            .unwrap();
        assert_eq!(output.refined.rows(), p + 1, "{model:?} refined rows");
        assert_eq!(output.refined.cols(), 1);
        assert_eq!(output.param_count(), p);
        assert_eq!(output.refined_params(0).len(), p);
    }
}

/// Test that requested tables are allocated and unrequested ones are not.
#[test]
fn test_requested_outputs_only() {
    let transient = decay_curve(10.0, 1000.0, 2.0);
    let prompt = identity_prompt();
    let transients = CurveMatrix::from_flat(&transient, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let minimal = FlimFit::new().build().unwrap();
    let output = minimal.fit(&transients, &prompts, &[DT], None).unwrap();
    assert!(output.rapid.is_none());
    assert!(output.fitted.is_none());
    assert!(output.rapid_fitted.is_none());
    assert_eq!(output.statuses.len(), 1, "statuses are always produced");

    let full = fitter(DecayModel::SingleExp);
    let output = full.fit(&transients, &prompts, &[DT], None).unwrap();
    let rapid = output.rapid.as_ref().unwrap();
    assert_eq!((rapid.rows(), rapid.cols()), (3, 1));
    let fitted = output.fitted.as_ref().unwrap();
    assert_eq!((fitted.rows(), fitted.cols()), (N_BINS, 1));
    let rapid_fitted = output.rapid_fitted.as_ref().unwrap();
    assert_eq!((rapid_fitted.rows(), rapid_fitted.cols()), (N_BINS, 1));
}

/// Test that fitted curves are zeroed outside the fit window.
#[test]
fn test_fitted_curve_zero_outside_window() {
    let transient = decay_curve(10.0, 1000.0, 2.0);
    let prompt = identity_prompt();
    let transients = CurveMatrix::from_flat(&transient, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let output = FlimFit::new()
        .fit_start(8)
        .fit_end(48)
        .return_fitted()
        .build()
        .unwrap()
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();

    let curve = output.fitted.as_ref().unwrap().column(0);
    assert!(curve[..8].iter().all(|&v| v == 0.0));
    assert!(curve[48..].iter().all(|&v| v == 0.0));
    assert!(curve[8..48].iter().any(|&v| v != 0.0));
}

// ============================================================================
// Broadcast Semantics Tests
// ============================================================================

/// Test that a shared prompt/time-step batch matches per-transient calls.
///
/// A batch of N transients with one shared reference curve must produce the
/// same results as N separate single-transient fits.
#[test]
fn test_shared_prompt_matches_individual_fits() {
    let curves = [
        decay_curve(5.0, 800.0, 1.5),
        decay_curve(20.0, 1200.0, 2.5),
        decay_curve(0.0, 1000.0, 3.0),
    ];
    let prompt = identity_prompt();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let mut batch_data = Vec::new();
    for curve in &curves {
        batch_data.extend_from_slice(curve);
    }
    let batch = CurveMatrix::from_flat(&batch_data, N_BINS).unwrap();

    let model = fitter(DecayModel::SingleExp);
    let batched = model.fit(&batch, &prompts, &[DT], None).unwrap();

    for (i, curve) in curves.iter().enumerate() {
        let single = CurveMatrix::from_flat(curve, N_BINS).unwrap();
        let output = model.fit(&single, &prompts, &[DT], None).unwrap();
        assert_eq!(
            output.rapid.as_ref().unwrap().column(0),
            batched.rapid.as_ref().unwrap().column(i),
            "rapid params of transient {i}"
        );
        assert_eq!(
            output.refined.column(0),
            batched.refined.column(i),
            "refined params of transient {i}"
        );
    }
}

/// Test that one shared sigma curve applies to every transient.
#[test]
fn test_sigma_broadcast() {
    let curves: Vec<Vec<f32>> = (0..5)
        .map(|k| decay_curve(10.0, 900.0 + 50.0 * k as f32, 2.0))
        .collect();
    let mut batch_data = Vec::new();
    for curve in &curves {
        batch_data.extend_from_slice(curve);
    }
    let batch = CurveMatrix::from_flat(&batch_data, N_BINS).unwrap();
    let prompt = identity_prompt();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();
    let sigma: Vec<f32> = vec![4.0; N_BINS];
    let sigmas = CurveMatrix::from_flat(&sigma, N_BINS).unwrap();

    let model = FlimFit::new()
        .noise_model(NoiseModel::Given)
        .return_rapid_params()
        .build()
        .unwrap();
    let batched = model.fit(&batch, &prompts, &[DT], Some(&sigmas)).unwrap();
    assert_eq!(batched.transient_count(), 5);

    for (i, curve) in curves.iter().enumerate() {
        let single = CurveMatrix::from_flat(curve, N_BINS).unwrap();
        let output = model.fit(&single, &prompts, &[DT], Some(&sigmas)).unwrap();
        assert_eq!(output.refined.column(0), batched.refined.column(i));
    }
}

/// Test per-transient time increments against individual fits.
#[test]
fn test_per_transient_time_steps() {
    let curves = [decay_curve(5.0, 800.0, 1.5), decay_curve(5.0, 800.0, 1.5)];
    let mut batch_data = Vec::new();
    for curve in &curves {
        batch_data.extend_from_slice(curve);
    }
    let batch = CurveMatrix::from_flat(&batch_data, N_BINS).unwrap();
    let prompt = identity_prompt();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();
    let steps = [0.05_f32, 0.1];

    let model = fitter(DecayModel::SingleExp);
    let batched = model.fit(&batch, &prompts, &steps, None).unwrap();

    // The same curve sampled at twice the bin width reads as twice the
    // lifetime.
    let tau_0 = batched.refined_params(0)[2];
    let tau_1 = batched.refined_params(1)[2];
    assert_relative_eq!(tau_1, 2.0 * tau_0, max_relative = 1e-3);
}

// ============================================================================
// Status Tests
// ============================================================================

/// Test that a clean synthetic decay converges in both stages.
#[test]
fn test_clean_decay_converges() {
    let transient = decay_curve(10.0, 1000.0, 2.0);
    let prompt = identity_prompt();
    let transients = CurveMatrix::from_flat(&transient, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let output = fitter(DecayModel::SingleExp)
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();
    let status = output.status(0);
    assert!(status.rapid.is_converged(), "rapid: {:?}", status.rapid);
    assert!(status.refine.is_converged(), "refine: {:?}", status.refine);
    assert!(output.all_converged());
}

/// Test that a non-decaying transient fails softly without aborting the
/// batch.
///
/// The failing transient's column is still filled and its status records a
/// tagged failure; the healthy transient converges normally.
#[test]
fn test_engine_failure_does_not_abort_batch() {
    let flat_curve = vec![100.0_f32; N_BINS];
    let good_curve = decay_curve(10.0, 1000.0, 2.0);
    let mut batch_data = flat_curve.clone();
    batch_data.extend_from_slice(&good_curve);
    let batch = CurveMatrix::from_flat(&batch_data, N_BINS).unwrap();
    let prompt = identity_prompt();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let output = fitter(DecayModel::SingleExp)
        .fit(&batch, &prompts, &[DT], None)
        .unwrap();

    assert_eq!(output.transient_count(), 2);
    assert!(
        output.status(0).rapid.is_failed(),
        "flat curve rapid stage: {:?}",
        output.status(0).rapid
    );
    assert!(output.status(1).refine.is_converged());
    // The failed transient still occupies its output column.
    assert_eq!(output.refined.column(0).len(), 4);
}

// ============================================================================
// Goodness-of-Fit Tests
// ============================================================================

/// Test that the reduced chi-square is the raw statistic divided by
/// `(fit_end - fit_start - p)`.
#[test]
fn test_reduced_chi_sq_arithmetic() {
    let transient = decay_curve(10.0, 1000.0, 2.0);
    let prompt = identity_prompt();
    let transients = CurveMatrix::from_flat(&transient, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 2).unwrap();

    let fit_start = 4;
    let fit_end = 60;
    let output = FlimFit::new()
        .fit_start(fit_start)
        .fit_end(fit_end)
        .build()
        .unwrap()
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();

    let dof = (fit_end - fit_start - 3) as f32;
    let raw = output.status(0).refine.chi_sq();
    assert_relative_eq!(
        output.reduced_chi_sq(0),
        raw / dof,
        max_relative = 1e-6
    );
}

// ============================================================================
// Builder Tests
// ============================================================================

/// Test builder defaults.
#[test]
fn test_builder_defaults() {
    let model: FlimFitter<f32> = FlimFit::new().build().unwrap();
    assert_eq!(model.model, DecayModel::SingleExp);
    assert_eq!(model.noise_model, NoiseModel::GaussianFit);
    assert_relative_eq!(model.chi_sq_target, 1.1);
    assert_relative_eq!(model.chi_sq_delta, 0.001);
    assert_eq!(model.fit_start, 0);
    assert_eq!(model.fit_end, None);
}

/// Test that setting a parameter twice is rejected at build time.
#[test]
fn test_duplicate_parameter_rejected() {
    let res = FlimFit::<f32>::new().fit_start(2).fit_start(3).build();
    assert!(matches!(
        res,
        Err(FlimError::DuplicateParameter {
            parameter: "fit_start"
        })
    ));
}

/// Test that an invalid chi-square target is rejected at build time.
#[test]
fn test_invalid_target_rejected_at_build() {
    let res = FlimFit::new().chi_sq_target(0.5_f32).build();
    assert!(matches!(res, Err(FlimError::InvalidChiSqTarget(_))));
}
