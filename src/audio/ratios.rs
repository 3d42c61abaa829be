//! Signal-level ratios folded over a complete feature series.

use super::features::{sign, FeatureKind, FeatureSeries};
use crate::error::{AnalysisError, Result};

/// Low short-time-energy ratio: share of frames whose energy is below half
/// the mean energy. Frames exactly at the boundary count one half.
pub fn low_short_time_energy_ratio(ste: &FeatureSeries) -> Result<f64> {
    expect_kind(ste, FeatureKind::ShortTimeEnergy)?;
    let mean = checked_mean(ste)?;
    let m = ste.len() as f64;
    let sum: f64 = ste.values.iter().map(|&e| sign(0.5 * mean - e) + 1.0).sum();
    Ok(sum / (2.0 * m))
}

/// High zero-crossing-rate ratio: share of frames whose ZCR exceeds 1.5x
/// the mean ZCR. Frames exactly at the boundary count one half.
pub fn high_zero_crossing_rate_ratio(zcr: &FeatureSeries) -> Result<f64> {
    expect_kind(zcr, FeatureKind::ZeroCrossingRate)?;
    let mean = checked_mean(zcr)?;
    let m = zcr.len() as f64;
    let sum: f64 = zcr.values.iter().map(|&z| sign(z - 1.5 * mean) + 1.0).sum();
    Ok(sum / (2.0 * m))
}

fn expect_kind(series: &FeatureSeries, kind: FeatureKind) -> Result<()> {
    if series.kind != kind {
        return Err(AnalysisError::input(format!(
            "expected a {} series, got {}",
            kind, series.kind
        )));
    }
    Ok(())
}

fn checked_mean(series: &FeatureSeries) -> Result<f64> {
    let mean = series
        .mean()
        .ok_or_else(|| AnalysisError::input(format!("empty {} series", series.kind)))?;
    if !mean.is_finite() {
        return Err(AnalysisError::input(format!(
            "{} series contains non-finite values",
            series.kind
        )));
    }
    Ok(mean)
}
