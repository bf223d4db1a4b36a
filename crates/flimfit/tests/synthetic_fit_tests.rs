//! End-to-end recovery tests on synthetic decays.
//!
//! These tests generate transients from known parameters — a single
//! exponential decay convolved with a narrow normalized prompt, with and
//! without shot noise — and verify that the two-stage fit recovers the
//! parameters within tolerance, with a reduced chi-square near 1 on noisy
//! data.
//!
//! ## Test Organization
//!
//! 1. **Noise-free recovery** - Near-exact parameter recovery
//! 2. **Noisy recovery** - Tolerance-based recovery, reduced chi-square
//! 3. **Batch recovery** - Per-transient parameters across a varied batch

use approx::assert_relative_eq;
use flimfit::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

// ============================================================================
// Synthetic Data Generation
// ============================================================================

const N_BINS: usize = 256;
const DT: f64 = 0.05;

/// Generate a transient the same way the fitter models it: the decay
/// component convolved with the prompt, plus the constant offset.
fn synthesize(z: f64, a: f64, tau: f64, prompt: &[f64]) -> Vec<f64> {
    let decay: Vec<f64> = (0..N_BINS)
        .map(|i| a * (-(i as f64) * DT / tau).exp())
        .collect();
    let mut curve = vec![0.0; N_BINS];
    for i in 0..N_BINS {
        let top = prompt.len().min(i + 1);
        for (j, &p) in prompt.iter().take(top).enumerate() {
            curve[i] += p * decay[i - j];
        }
        curve[i] += z;
    }
    curve
}

/// Add Gaussian shot noise with variance equal to the clean signal.
fn add_shot_noise(curve: &mut [f64], rng: &mut StdRng) {
    let normal = Normal::new(0.0, 1.0).unwrap();
    for v in curve.iter_mut() {
        *v += normal.sample(rng) * v.sqrt();
    }
}

fn narrow_prompt() -> Vec<f64> {
    vec![0.25, 0.5, 0.25]
}

// ============================================================================
// Noise-Free Recovery
// ============================================================================

/// Test near-exact recovery from a clean convolved decay.
#[test]
fn test_noise_free_recovery() {
    let (z, a, tau) = (100.0, 4000.0, 2.0);
    let prompt = narrow_prompt();
    let curve = synthesize(z, a, tau, &prompt);

    let transients = CurveMatrix::from_flat(&curve, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 3).unwrap();

    let output = FlimFit::new()
        .model(DecayModel::SingleExp)
        .return_rapid_params()
        .build()
        .unwrap()
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();

    let params = output.refined_params(0);
    assert_relative_eq!(params[0], z, max_relative = 1e-3);
    assert_relative_eq!(params[1], a, max_relative = 1e-3);
    assert_relative_eq!(params[2], tau, max_relative = 1e-3);
    assert!(
        output.status(0).refine.is_converged(),
        "refine: {:?}",
        output.status(0).refine
    );
    assert!(
        output.reduced_chi_sq(0) < 0.1,
        "clean data leaves essentially no residual, got {}",
        output.reduced_chi_sq(0)
    );
}

// ============================================================================
// Noisy Recovery
// ============================================================================

/// Test recovery from a shot-noised decay, with reduced chi-square near 1.
///
/// The noise variance equals the signal, matching the Gaussian-on-fit
/// weighting, so the reduced chi-square should land near 1.
#[test]
fn test_noisy_recovery() {
    let (z, a, tau) = (100.0, 4000.0, 2.0);
    let prompt = narrow_prompt();
    let mut curve = synthesize(z, a, tau, &prompt);
    let mut rng = StdRng::seed_from_u64(42);
    add_shot_noise(&mut curve, &mut rng);

    let transients = CurveMatrix::from_flat(&curve, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 3).unwrap();

    let output = FlimFit::new()
        .model(DecayModel::SingleExp)
        .chi_sq_target(1.5)
        .return_fitted()
        .build()
        .unwrap()
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();

    let params = output.refined_params(0);
    assert_relative_eq!(params[0], z, max_relative = 0.2);
    assert_relative_eq!(params[1], a, max_relative = 0.05);
    assert_relative_eq!(params[2], tau, max_relative = 0.05);

    let reduced = output.reduced_chi_sq(0);
    assert!(
        (0.7..1.4).contains(&reduced),
        "reduced chi-square near 1, got {reduced}"
    );

    // The fitted curve tracks the data inside the window.
    let fitted = output.fitted.as_ref().unwrap().column(0);
    let clean = synthesize(z, a, tau, &prompt);
    for i in (0..N_BINS - 1).step_by(16) {
        let expected = clean[i];
        assert!(
            (fitted[i] - expected).abs() < 6.0 * expected.sqrt().max(1.0),
            "fitted[{i}] = {} vs clean {expected}",
            fitted[i]
        );
    }
}

// ============================================================================
// Batch Recovery
// ============================================================================

/// Test per-transient recovery across a batch of varied lifetimes.
#[test]
fn test_batch_recovery_varied_lifetimes() {
    let prompt = narrow_prompt();
    let truths = [(50.0, 3000.0, 1.0), (100.0, 4000.0, 2.0), (20.0, 2500.0, 3.5)];
    let mut rng = StdRng::seed_from_u64(7);

    let mut batch_data = Vec::new();
    for &(z, a, tau) in &truths {
        let mut curve = synthesize(z, a, tau, &prompt);
        add_shot_noise(&mut curve, &mut rng);
        batch_data.extend_from_slice(&curve);
    }
    let transients = CurveMatrix::from_flat(&batch_data, N_BINS).unwrap();
    let prompts = CurveMatrix::from_flat(&prompt, 3).unwrap();

    let output = FlimFit::new()
        .model(DecayModel::SingleExp)
        .chi_sq_target(1.5)
        .build()
        .unwrap()
        .fit(&transients, &prompts, &[DT], None)
        .unwrap();

    for (i, &(_, a, tau)) in truths.iter().enumerate() {
        let params = output.refined_params(i);
        assert_relative_eq!(params[1], a, max_relative = 0.05);
        assert_relative_eq!(params[2], tau, max_relative = 0.05);
    }
}
