use crate::error::{AnalysisError, Result};

/// Rescale a sample buffer into `[-1, 1]` by its largest absolute value.
///
/// The scale is `max(|min|, |max|)`, so buffers that are entirely negative
/// normalize correctly. Fails on an empty buffer, a silence-only buffer
/// (zero scale) and buffers containing non-finite samples.
pub fn scale(signal: &[f32]) -> Result<Vec<f32>> {
    if signal.is_empty() {
        return Err(AnalysisError::input("cannot normalize an empty signal"));
    }

    if signal.iter().any(|s| !s.is_finite()) {
        return Err(AnalysisError::input("signal contains non-finite samples"));
    }

    let (min, max) = signal
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    let peak = min.abs().max(max.abs());

    if peak == 0.0 {
        return Err(AnalysisError::input(
            "cannot normalize a silent signal (scale is zero)",
        ));
    }

    Ok(signal.iter().map(|&s| s / peak).collect())
}
