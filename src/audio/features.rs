use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::framing::FrameSet;
use super::pitch::{self, PitchBand};
use crate::error::{AnalysisError, Result};

/// Time-domain measures that map one frame to one scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    #[serde(alias = "ste")]
    ShortTimeEnergy,
    Volume,
    #[serde(alias = "zcr")]
    ZeroCrossingRate,
    #[serde(alias = "acf")]
    Autocorrelation,
    #[serde(alias = "amd")]
    AverageMagnitudeDifference,
    #[serde(alias = "f0")]
    FundamentalFrequency,
}

/// Optional inputs some feature kinds need. Missing values are an error,
/// never replaced by a default.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureParams {
    pub lag: Option<usize>,
    pub sample_rate: Option<u32>,
    pub band: PitchBand,
}

/// One feature value per frame, in frame order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureSeries {
    pub kind: FeatureKind,
    pub values: Vec<f64>,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 6] = [
        FeatureKind::ShortTimeEnergy,
        FeatureKind::Volume,
        FeatureKind::ZeroCrossingRate,
        FeatureKind::Autocorrelation,
        FeatureKind::AverageMagnitudeDifference,
        FeatureKind::FundamentalFrequency,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::ShortTimeEnergy => "short_time_energy",
            FeatureKind::Volume => "volume",
            FeatureKind::ZeroCrossingRate => "zero_crossing_rate",
            FeatureKind::Autocorrelation => "autocorrelation",
            FeatureKind::AverageMagnitudeDifference => "average_magnitude_difference",
            FeatureKind::FundamentalFrequency => "fundamental_frequency",
        }
    }

    pub fn needs_lag(&self) -> bool {
        matches!(
            self,
            FeatureKind::Autocorrelation | FeatureKind::AverageMagnitudeDifference
        )
    }

    /// Evaluate this feature on a single frame.
    pub fn compute(&self, frame: &[f32], params: &FeatureParams) -> Result<f64> {
        match self {
            FeatureKind::ShortTimeEnergy => short_time_energy(frame),
            FeatureKind::Volume => volume(frame),
            FeatureKind::ZeroCrossingRate => zero_crossing_rate(frame),
            FeatureKind::Autocorrelation => autocorrelation(frame, required_lag(self, params)?),
            FeatureKind::AverageMagnitudeDifference => {
                average_magnitude_difference(frame, required_lag(self, params)?)
            }
            FeatureKind::FundamentalFrequency => {
                let sample_rate = params.sample_rate.ok_or_else(|| {
                    AnalysisError::input("fundamental_frequency requires a sample rate")
                })?;
                pitch::fundamental_frequency_in_band(frame, sample_rate, params.band)
            }
        }
    }
}

fn required_lag(kind: &FeatureKind, params: &FeatureParams) -> Result<usize> {
    params
        .lag
        .ok_or_else(|| AnalysisError::input(format!("{} requires a lag", kind)))
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ste" | "short_time_energy" => FeatureKind::ShortTimeEnergy,
            "volume" => FeatureKind::Volume,
            "zcr" | "zero_crossing_rate" => FeatureKind::ZeroCrossingRate,
            "acf" | "autocorrelation" => FeatureKind::Autocorrelation,
            "amd" | "average_magnitude_difference" => FeatureKind::AverageMagnitudeDifference,
            "f0" | "fundamental_frequency" => FeatureKind::FundamentalFrequency,
            other => return Err(format!("unknown feature: {}", other)),
        };
        Ok(kind)
    }
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Start time in seconds of the frame behind each value.
    pub fn times(&self, frames: &FrameSet) -> Vec<f64> {
        (0..self.values.len())
            .map(|i| frames.frame_start_time(i))
            .collect()
    }
}

/// Compute `kind` over every frame of `frames`. Frames are processed in
/// parallel; the result keeps frame order.
pub fn extract_series(
    frames: &FrameSet,
    kind: FeatureKind,
    params: &FeatureParams,
) -> Result<FeatureSeries> {
    let values = frames
        .par_iter()
        .map(|frame| kind.compute(frame, params))
        .collect::<Result<Vec<f64>>>()?;
    Ok(FeatureSeries { kind, values })
}

/// Three-valued sign with `sign(0) == 0`.
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Reject frames holding NaN or infinite samples, which would otherwise
/// surface as NaN features or as a plausible-looking pitch.
pub fn check_finite(frame: &[f32]) -> Result<()> {
    match frame.iter().position(|s| !s.is_finite()) {
        Some(i) => Err(AnalysisError::frame(format!(
            "non-finite sample {} at index {}",
            frame[i], i
        ))),
        None => Ok(()),
    }
}

/// Mean squared amplitude: `(1/N) * Σ x[i]²`.
pub fn short_time_energy(frame: &[f32]) -> Result<f64> {
    if frame.is_empty() {
        return Err(AnalysisError::frame("short-time energy of an empty frame"));
    }
    check_finite(frame)?;
    let sum: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    Ok(sum / frame.len() as f64)
}

/// Root of the short-time energy.
pub fn volume(frame: &[f32]) -> Result<f64> {
    short_time_energy(frame).map(f64::sqrt)
}

/// `(1/(2N)) * Σ |sign(x[i]) - sign(x[i-1])|`, in `[0, 1]`.
pub fn zero_crossing_rate(frame: &[f32]) -> Result<f64> {
    let n = frame.len();
    if n < 2 {
        return Err(AnalysisError::frame(format!(
            "zero-crossing rate needs at least 2 samples (got {})",
            n
        )));
    }
    check_finite(frame)?;
    let changes: f64 = frame
        .windows(2)
        .map(|w| (sign(w[1] as f64) - sign(w[0] as f64)).abs())
        .sum();
    Ok(changes / (2 * n) as f64)
}

/// Raw autocorrelation `Σ x[i+lag] * x[i]` over the overlapping part.
pub fn autocorrelation(frame: &[f32], lag: usize) -> Result<f64> {
    check_lag(frame, lag)?;
    Ok(frame[lag..]
        .iter()
        .zip(frame.iter())
        .map(|(&a, &b)| a as f64 * b as f64)
        .sum())
}

/// `Σ |sign(x[i+lag]) - sign(x[i])|` over the overlapping part.
pub fn average_magnitude_difference(frame: &[f32], lag: usize) -> Result<f64> {
    if frame.len() < 2 {
        return Err(AnalysisError::frame(format!(
            "average magnitude difference needs at least 2 samples (got {})",
            frame.len()
        )));
    }
    check_lag(frame, lag)?;
    Ok(frame[lag..]
        .iter()
        .zip(frame.iter())
        .map(|(&a, &b)| (sign(a as f64) - sign(b as f64)).abs())
        .sum())
}

fn check_lag(frame: &[f32], lag: usize) -> Result<()> {
    if lag >= frame.len() {
        return Err(AnalysisError::frame(format!(
            "lag {} is out of range for a frame of {} samples",
            lag,
            frame.len()
        )));
    }
    check_finite(frame)
}
