//! flimfit Batch Fitting Examples
//!
//! This example demonstrates the core batch-fitting workflow:
//! - Single-transient fitting with default settings
//! - Requesting rapid-estimate parameters and fitted curves
//! - Broadcast inputs (one shared prompt for a whole batch)
//! - Inspecting per-transient statuses

use flimfit::prelude::*;

fn main() -> Result<(), FlimError> {
    println!("{}", "=".repeat(80));
    println!("flimfit Batch Fitting Examples");
    println!("{}", "=".repeat(80));
    println!();

    example_1_single_transient()?;
    example_2_batch_with_shared_prompt()?;
    example_3_statuses()?;

    Ok(())
}

/// Synthesize a single-exponential transient convolved with a prompt.
fn synthesize(n: usize, dt: f32, z: f32, a: f32, tau: f32, prompt: &[f32]) -> Vec<f32> {
    let decay: Vec<f32> = (0..n).map(|i| a * (-(i as f32) * dt / tau).exp()).collect();
    (0..n)
        .map(|i| {
            let top = prompt.len().min(i + 1);
            let conv: f32 = prompt
                .iter()
                .take(top)
                .enumerate()
                .map(|(j, &p)| p * decay[i - j])
                .sum();
            conv + z
        })
        .collect()
}

/// Example 1: Single-Transient Fit
/// Fits one curve with the default single-exponential model.
fn example_1_single_transient() -> Result<(), FlimError> {
    println!("Example 1: Single-Transient Fit");
    println!("{}", "-".repeat(80));

    let (n, dt) = (256, 0.05_f32);
    let prompt = vec![0.25_f32, 0.5, 0.25];
    let curve = synthesize(n, dt, 50.0, 2000.0, 2.0, &prompt);

    let transients = CurveMatrix::from_flat(&curve, n)?;
    let prompts = CurveMatrix::from_flat(&prompt, 3)?;

    let fitter = FlimFit::new().return_rapid_params().build()?;
    let output = fitter.fit(&transients, &prompts, &[dt], None)?;

    let params = output.refined_params(0);
    println!("Refined:  z = {:.2}, a = {:.1}, tau = {:.4}", params[0], params[1], params[2]);
    println!("Reduced chi-square: {:.4}", output.reduced_chi_sq(0));

    println!();
    Ok(())
}

/// Example 2: Batch Fit with a Shared Prompt
/// One reference curve broadcasts across every transient in the batch.
fn example_2_batch_with_shared_prompt() -> Result<(), FlimError> {
    println!("Example 2: Batch Fit with a Shared Prompt");
    println!("{}", "-".repeat(80));

    let (n, dt) = (256, 0.05_f32);
    let prompt = vec![0.25_f32, 0.5, 0.25];
    let lifetimes = [1.0_f32, 1.8, 2.6, 3.4];

    let mut batch = Vec::with_capacity(n * lifetimes.len());
    for &tau in &lifetimes {
        batch.extend(synthesize(n, dt, 30.0, 2500.0, tau, &prompt));
    }
    let transients = CurveMatrix::from_flat(&batch, n)?;
    let prompts = CurveMatrix::from_flat(&prompt, 3)?;

    let fitter = FlimFit::new().return_fitted().build()?;
    let output = fitter.fit(&transients, &prompts, &[dt], None)?;

    for (i, &tau) in lifetimes.iter().enumerate() {
        println!(
            "Transient {i}: true tau = {tau:.1}, fitted tau = {:.4}",
            output.refined_params(i)[2]
        );
    }

    println!();
    Ok(())
}

/// Example 3: Per-Transient Statuses
/// A degenerate (non-decaying) curve fails softly; the batch continues.
fn example_3_statuses() -> Result<(), FlimError> {
    println!("Example 3: Per-Transient Statuses");
    println!("{}", "-".repeat(80));

    let (n, dt) = (256, 0.05_f32);
    let prompt = vec![0.5_f32, 0.5];
    let good = synthesize(n, dt, 50.0, 2000.0, 2.0, &prompt);
    let flat = vec![100.0_f32; n];

    let mut batch = good;
    batch.extend_from_slice(&flat);
    let transients = CurveMatrix::from_flat(&batch, n)?;
    let prompts = CurveMatrix::from_flat(&prompt, 2)?;

    let output = FlimFit::new().build()?.fit(&transients, &prompts, &[dt], None)?;

    for i in 0..output.transient_count() {
        let status = output.status(i);
        println!("Transient {i}: rapid = {:?}", status.rapid);
        println!("             refine = {:?}", status.refine);
    }
    println!("{output}");

    Ok(())
}
