use serde::Serialize;
use std::fmt;

use super::features::{check_finite, zero_crossing_rate, FeatureKind, FeatureSeries};
use super::framing::FrameSet;
use crate::error::{AnalysisError, Result};

/// True when the frame's mean absolute amplitude does not exceed `volume_threshold`.
pub fn is_silent(frame: &[f32], volume_threshold: f64) -> Result<bool> {
    if frame.is_empty() {
        return Err(AnalysisError::frame("silence check on an empty frame"));
    }
    check_finite(frame)?;
    let mean_abs = frame.iter().map(|&s| (s as f64).abs()).sum::<f64>() / frame.len() as f64;
    Ok(mean_abs <= volume_threshold)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Voicing {
    Silence,
    Voiced,
    Unvoiced,
}

/// Silence first, then a ZCR boundary: periodic (voiced) frames cross zero
/// less often than noise-like (unvoiced) ones.
pub fn classify_voicing(frame: &[f32], silence_threshold: f64, voiced_zcr_threshold: f64) -> Result<Voicing> {
    if is_silent(frame, silence_threshold)? {
        return Ok(Voicing::Silence);
    }
    if zero_crossing_rate(frame)? < voiced_zcr_threshold {
        Ok(Voicing::Voiced)
    } else {
        Ok(Voicing::Unvoiced)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionLabel {
    Silence,
    Speech,
    Music,
}

impl fmt::Display for RegionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionLabel::Silence => write!(f, "silence"),
            RegionLabel::Speech => write!(f, "speech"),
            RegionLabel::Music => write!(f, "music"),
        }
    }
}

/// Labelled half-open interval `[start, end)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
    pub label: RegionLabel,
}

impl Region {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered, gap-free sequence of labelled regions.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegionPartition {
    regions: Vec<Region>,
}

/// Thresholds for the speech/music/silence decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionThresholds {
    /// Mean absolute amplitude at or below which a frame is silent.
    pub silence: f64,
    /// ZCR above which a non-silent frame is speech.
    pub speech_zcr: f64,
}

impl RegionPartition {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Coalesce neighbouring regions that carry the same label.
    pub fn merged(&self) -> RegionPartition {
        let mut regions: Vec<Region> = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            match regions.last_mut() {
                Some(last) if last.label == region.label => last.end = region.end,
                _ => regions.push(*region),
            }
        }
        RegionPartition { regions }
    }

    /// Total seconds labelled `label`.
    pub fn duration_of(&self, label: RegionLabel) -> f64 {
        self.regions
            .iter()
            .filter(|r| r.label == label)
            .map(Region::duration)
            .sum()
    }
}

/// Label each frame of a non-overlapping frame set as silence, speech or music.
///
/// `zcr` must be the zero-crossing-rate series of `frames`. One region is
/// emitted per frame, in frame order, covering `[0, len * frame_duration)`.
pub fn classify_regions(
    frames: &FrameSet,
    zcr: &FeatureSeries,
    thresholds: &RegionThresholds,
) -> Result<RegionPartition> {
    if frames.frame_step() != frames.frame_length() {
        return Err(AnalysisError::ParameterConflict(format!(
            "region classification needs non-overlapping frames (step {} != length {})",
            frames.frame_step(),
            frames.frame_length()
        )));
    }
    if zcr.kind != FeatureKind::ZeroCrossingRate {
        return Err(AnalysisError::input(format!(
            "region classification needs a zero_crossing_rate series, got {}",
            zcr.kind
        )));
    }
    if zcr.len() != frames.len() {
        return Err(AnalysisError::input(format!(
            "ZCR series has {} values for {} frames",
            zcr.len(),
            frames.len()
        )));
    }

    let sample_rate = frames.sample_rate() as f64;
    let frame_length = frames.frame_length();

    let regions = frames
        .iter()
        .zip(zcr.values.iter())
        .enumerate()
        .map(|(i, (frame, &z))| {
            let label = if is_silent(frame, thresholds.silence)? {
                RegionLabel::Silence
            } else if z > thresholds.speech_zcr {
                RegionLabel::Speech
            } else {
                RegionLabel::Music
            };
            Ok(Region {
                start: (i * frame_length) as f64 / sample_rate,
                end: ((i + 1) * frame_length) as f64 / sample_rate,
                label,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("Classified {} regions", regions.len());
    Ok(RegionPartition { regions })
}
