use serde::{Deserialize, Serialize};

use super::features::{autocorrelation, check_finite};
use crate::error::{AnalysisError, Result};

/// Frequency range searched by the pitch estimator, in Hz.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchBand {
    pub f_min: f64,
    pub f_max: f64,
}

impl Default for PitchBand {
    fn default() -> Self {
        Self {
            f_min: 50.0,
            f_max: 400.0,
        }
    }
}

impl PitchBand {
    /// Autocorrelation lags `[lag_min, lag_max)` covering this band at `sample_rate`.
    pub fn lag_range(&self, sample_rate: u32) -> Result<(usize, usize)> {
        if !(self.f_min.is_finite() && self.f_max.is_finite())
            || self.f_min <= 0.0
            || self.f_min >= self.f_max
        {
            return Err(AnalysisError::input(format!(
                "invalid pitch band {}-{}Hz",
                self.f_min, self.f_max
            )));
        }
        if sample_rate == 0 {
            return Err(AnalysisError::input("sample rate must be positive"));
        }

        let lag_min = (sample_rate as f64 / self.f_max).floor() as usize;
        let lag_max = (sample_rate as f64 / self.f_min).floor() as usize;
        if lag_min == 0 || lag_min >= lag_max {
            return Err(AnalysisError::input(format!(
                "sample rate {}Hz is too low for a {}-{}Hz pitch search",
                sample_rate, self.f_min, self.f_max
            )));
        }
        Ok((lag_min, lag_max))
    }

    /// Shortest frame that can be searched at `sample_rate`.
    pub fn min_frame_length(&self, sample_rate: u32) -> Result<usize> {
        self.lag_range(sample_rate).map(|(_, lag_max)| lag_max + 1)
    }
}

/// Estimate the fundamental frequency of one frame over the default 50-400Hz band.
pub fn fundamental_frequency(frame: &[f32], sample_rate: u32) -> Result<f64> {
    fundamental_frequency_in_band(frame, sample_rate, PitchBand::default())
}

/// Pick the autocorrelation peak among the band's lags and convert it to Hz.
///
/// Ties resolve to the shortest lag. The result is only meaningful for
/// voiced, roughly periodic frames; gating is left to the caller.
pub fn fundamental_frequency_in_band(frame: &[f32], sample_rate: u32, band: PitchBand) -> Result<f64> {
    let (lag_min, lag_max) = band.lag_range(sample_rate)?;
    if frame.len() <= lag_max {
        return Err(AnalysisError::frame(format!(
            "pitch search up to lag {} needs a frame longer than that (got {} samples)",
            lag_max,
            frame.len()
        )));
    }
    check_finite(frame)?;

    let mut best_lag = lag_min;
    let mut best_value = f64::NEG_INFINITY;
    for lag in lag_min..lag_max {
        let value = autocorrelation(frame, lag)?;
        if value > best_value {
            best_value = value;
            best_lag = lag;
        }
    }

    Ok(sample_rate as f64 / best_lag as f64)
}
