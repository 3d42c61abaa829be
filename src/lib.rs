//! Frame-based time-domain analysis of mono audio.
//!
//! A signal is normalized, split into fixed-length overlapping frames, and
//! reduced to per-frame features (short-time energy, volume, zero-crossing
//! rate, autocorrelation, average magnitude difference, pitch). Those feed
//! silence/voicing decisions, speech/music region labelling and the
//! signal-level LSTER/HZCRR ratios.
//!
//! ```
//! use sonalyze::audio::{features, framing};
//!
//! let signal: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
//! let frames = framing::frame(&signal, 1000, 0.1, 0.1).unwrap();
//! assert_eq!(frames.len(), 10);
//! let ste = features::short_time_energy(frames.frame(0).unwrap()).unwrap();
//! assert_eq!(ste, 1.0);
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod report;

pub use audio::analysis::{analyze, range_metrics, AnalysisReport, RangeMetrics};
pub use audio::classify::{
    classify_regions, classify_voicing, is_silent, Region, RegionLabel, RegionPartition,
    RegionThresholds, Voicing,
};
pub use audio::decode::{decode_audio, AudioData};
pub use audio::features::{extract_series, FeatureKind, FeatureParams, FeatureSeries};
pub use audio::framing::{frame, frame_samples, FrameSet};
pub use audio::pitch::{fundamental_frequency, PitchBand};
pub use audio::ratios::{high_zero_crossing_rate_ratio, low_short_time_energy_ratio};
pub use config::Config;
pub use error::{AnalysisError, Result};
