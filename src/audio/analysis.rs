use rayon::prelude::*;
use serde::Serialize;

use super::classify::{classify_regions, classify_voicing, RegionPartition, RegionThresholds, Voicing};
use super::decode::AudioData;
use super::features::{self, extract_series, FeatureKind, FeatureParams, FeatureSeries};
use super::framing::{self, FrameSet};
use super::normalize;
use super::pitch;
use super::ratios::{high_zero_crossing_rate_ratio, low_short_time_energy_ratio};
use crate::config::Config;
use crate::error::{AnalysisError, Result};

/// Everything computed for one signal.
#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    pub sample_rate: u32,
    pub total_samples: usize,
    pub duration: f64,
    pub frame_length: usize,
    pub frame_step: usize,
    pub num_frames: usize,
    pub padding: usize,
    /// Start time of each frame, seconds
    pub frame_times: Vec<f64>,
    pub series: Vec<FeatureSeries>,
    pub lster: f64,
    pub hzcrr: f64,
    pub voicing: Vec<Voicing>,
    /// Per-frame f0 for voiced frames; absent when frames are too short for the pitch band
    pub pitch: Option<Vec<Option<f64>>>,
    pub regions: RegionPartition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeMetrics>,
}

/// Scalar features over a selected time range of the signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RangeMetrics {
    pub start: f64,
    pub end: f64,
    pub duration_ms: f64,
    pub ste: f64,
    pub volume: f64,
    pub zcr: f64,
    pub acf: f64,
    pub amd: f64,
}

/// Run the full frame analysis over one decoded signal.
///
/// `selection` optionally names two time marks (seconds) whose slice gets
/// its own [`RangeMetrics`].
pub fn analyze(audio: &AudioData, config: &Config, selection: Option<(f64, f64)>) -> Result<AnalysisReport> {
    let sr = audio.sample_rate;

    log::info!("Normalizing {} samples...", audio.samples.len());
    let signal = normalize::scale(&audio.samples)?;

    let frames = framing::frame(&signal, sr, config.framing.win_len, config.framing.win_hop)?;
    log::info!(
        "Framing: {} frames of {} samples, step {}",
        frames.len(),
        frames.frame_length(),
        frames.frame_step()
    );

    let params = FeatureParams {
        lag: Some(config.features.lag),
        sample_rate: Some(sr),
        band: config.pitch,
    };

    let mut series = Vec::with_capacity(config.features.kinds.len());
    for &kind in &config.features.kinds {
        if series.iter().any(|s: &FeatureSeries| s.kind == kind) {
            continue;
        }
        log::debug!("Extracting {}", kind);
        series.push(extract_series(&frames, kind, &params)?);
    }

    let ste = series_or_extract(&series, &frames, FeatureKind::ShortTimeEnergy, &params)?;
    let zcr = series_or_extract(&series, &frames, FeatureKind::ZeroCrossingRate, &params)?;
    let lster = low_short_time_energy_ratio(&ste)?;
    let hzcrr = high_zero_crossing_rate_ratio(&zcr)?;
    log::info!("LSTER={:.3}, HZCRR={:.3}", lster, hzcrr);

    let voicing = frames
        .par_iter()
        .map(|frame| {
            classify_voicing(
                frame,
                config.classify.silence_threshold,
                config.classify.voiced_zcr_threshold,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let pitch = pitch_track(&frames, &voicing, config)?;

    let region_frames = framing::frame(
        &signal,
        sr,
        config.classify.region_window,
        config.classify.region_window,
    )?;
    let region_zcr = extract_series(&region_frames, FeatureKind::ZeroCrossingRate, &params)?;
    let thresholds = RegionThresholds {
        silence: config.classify.silence_threshold,
        speech_zcr: config.classify.speech_zcr_threshold,
    };
    let regions = classify_regions(&region_frames, &region_zcr, &thresholds)?;

    let range = selection
        .map(|(a, b)| range_metrics(&signal, sr, a, b, config.features.lag))
        .transpose()?;

    Ok(AnalysisReport {
        sample_rate: sr,
        total_samples: audio.samples.len(),
        duration: audio.duration(),
        frame_length: frames.frame_length(),
        frame_step: frames.frame_step(),
        num_frames: frames.len(),
        padding: frames.padding(),
        frame_times: (0..frames.len()).map(|i| frames.frame_start_time(i)).collect(),
        series,
        lster,
        hzcrr,
        voicing,
        pitch,
        regions,
        range,
    })
}

fn series_or_extract(
    computed: &[FeatureSeries],
    frames: &FrameSet,
    kind: FeatureKind,
    params: &FeatureParams,
) -> Result<FeatureSeries> {
    match computed.iter().find(|s| s.kind == kind) {
        Some(series) => Ok(series.clone()),
        None => extract_series(frames, kind, params),
    }
}

fn pitch_track(frames: &FrameSet, voicing: &[Voicing], config: &Config) -> Result<Option<Vec<Option<f64>>>> {
    let min_len = match config.pitch.min_frame_length(frames.sample_rate()) {
        Ok(len) => len,
        Err(err) => {
            log::warn!("Skipping pitch track: {}", err);
            return Ok(None);
        }
    };
    if frames.frame_length() < min_len {
        log::warn!(
            "Skipping pitch track: frames of {} samples are shorter than the {} needed for {}-{}Hz",
            frames.frame_length(),
            min_len,
            config.pitch.f_min,
            config.pitch.f_max
        );
        return Ok(None);
    }

    let track = frames
        .par_iter()
        .zip(voicing.par_iter())
        .map(|(frame, v)| match v {
            Voicing::Voiced => {
                pitch::fundamental_frequency_in_band(frame, frames.sample_rate(), config.pitch).map(Some)
            }
            _ => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(track))
}

/// Features of the slice between two time marks, given in either order.
///
/// Marks are clamped to the signal; `signal` is expected to be normalized.
pub fn range_metrics(signal: &[f32], sample_rate: u32, a: f64, b: f64, lag: usize) -> Result<RangeMetrics> {
    if sample_rate == 0 {
        return Err(AnalysisError::input("sample rate must be positive"));
    }
    if !a.is_finite() || !b.is_finite() {
        return Err(AnalysisError::input("range marks must be finite"));
    }

    let duration = signal.len() as f64 / sample_rate as f64;
    let start = a.min(b).clamp(0.0, duration);
    let end = a.max(b).clamp(0.0, duration);

    let first = (start * sample_rate as f64).floor() as usize;
    let last = ((end * sample_rate as f64).floor() as usize).min(signal.len());
    if last <= first {
        return Err(AnalysisError::input(format!(
            "range {:.3}s-{:.3}s selects no samples",
            start, end
        )));
    }
    let slice = &signal[first..last];

    Ok(RangeMetrics {
        start,
        end,
        duration_ms: (end - start) * 1000.0,
        ste: features::short_time_energy(slice)?,
        volume: features::volume(slice)?,
        zcr: features::zero_crossing_rate(slice)?,
        acf: features::autocorrelation(slice, lag)?,
        amd: features::average_magnitude_difference(slice, lag)?,
    })
}
