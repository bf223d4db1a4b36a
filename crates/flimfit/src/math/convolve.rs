//! Discrete convolution with the instrument reference curve.
//!
//! The measured transient is the true decay convolved with the instrument's
//! impulse response (the "prompt"). Both engines therefore compare data
//! against the model convolved with the prompt; because convolution is
//! linear, the refiner's partial derivatives are convolved with the same
//! kernel.
//!
//! Signals are defined on the fit-window grid (index 0 at `fit_start`), and
//! the convolution is causal: output bin `i` sums `prompt[j] * signal[i - j]`
//! over the prompt samples that fit.

// External dependencies
use num_traits::Float;

/// Causal discrete convolution of `signal` with `prompt` into `out`.
///
/// `out` must have the same length as `signal`.
pub fn convolve<T: Float>(signal: &[T], prompt: &[T], out: &mut [T]) {
    debug_assert_eq!(signal.len(), out.len());
    for i in 0..signal.len() {
        let mut acc = T::zero();
        let top = prompt.len().min(i + 1);
        for (j, &p) in prompt.iter().take(top).enumerate() {
            acc = acc + p * signal[i - j];
        }
        out[i] = acc;
    }
}
