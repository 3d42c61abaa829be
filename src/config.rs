use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

use crate::audio::features::FeatureKind;
use crate::audio::pitch::PitchBand;
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub framing: FramingConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub classify: ClassifyConfig,
    #[serde(default)]
    pub pitch: PitchBand,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FramingConfig {
    /// Window length in seconds
    #[serde(default = "default_win_len")]
    pub win_len: f64,
    /// Step between window starts in seconds
    #[serde(default = "default_win_hop")]
    pub win_hop: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_kinds")]
    pub kinds: Vec<FeatureKind>,
    /// Lag in samples for autocorrelation / AMD
    #[serde(default = "default_lag")]
    pub lag: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyConfig {
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f64,
    #[serde(default = "default_speech_zcr_threshold")]
    pub speech_zcr_threshold: f64,
    #[serde(default = "default_voiced_zcr_threshold")]
    pub voiced_zcr_threshold: f64,
    /// Length of the non-overlapping frames used for region labelling, seconds
    #[serde(default = "default_region_window")]
    pub region_window: f64,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            win_len: default_win_len(),
            win_hop: default_win_hop(),
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            lag: default_lag(),
        }
    }
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            silence_threshold: default_silence_threshold(),
            speech_zcr_threshold: default_speech_zcr_threshold(),
            voiced_zcr_threshold: default_voiced_zcr_threshold(),
            region_window: default_region_window(),
        }
    }
}

fn default_win_len() -> f64 { 0.025 }
fn default_win_hop() -> f64 { 0.010 }
fn default_kinds() -> Vec<FeatureKind> {
    vec![FeatureKind::ShortTimeEnergy, FeatureKind::ZeroCrossingRate]
}
fn default_lag() -> usize { 10 }
fn default_silence_threshold() -> f64 { 0.01 }
fn default_speech_zcr_threshold() -> f64 { 0.15 }
fn default_voiced_zcr_threshold() -> f64 { 0.45 }
fn default_region_window() -> f64 { 0.1 }

impl Config {
    /// Reject unusable settings before any audio is decoded. Unlike the
    /// framer itself, a hop longer than the window is refused here.
    pub fn validate(&self) -> Result<()> {
        positive("framing.win_len", self.framing.win_len)?;
        positive("framing.win_hop", self.framing.win_hop)?;
        positive("classify.region_window", self.classify.region_window)?;
        if self.framing.win_hop > self.framing.win_len {
            return Err(AnalysisError::ParameterConflict(format!(
                "frame step ({}s) can't be larger than frame length ({}s)",
                self.framing.win_hop, self.framing.win_len
            )));
        }
        non_negative("classify.silence_threshold", self.classify.silence_threshold)?;
        non_negative("classify.speech_zcr_threshold", self.classify.speech_zcr_threshold)?;
        non_negative("classify.voiced_zcr_threshold", self.classify.voiced_zcr_threshold)?;
        if !(self.pitch.f_min > 0.0 && self.pitch.f_min < self.pitch.f_max) {
            return Err(AnalysisError::input(format!(
                "pitch band must satisfy 0 < f_min < f_max (got {}-{})",
                self.pitch.f_min, self.pitch.f_max
            )));
        }
        if self.features.kinds.is_empty() {
            return Err(AnalysisError::input("features.kinds must not be empty"));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::input(format!("{} must be positive (got {})", name, value)))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::input(format!("{} must be non-negative (got {})", name, value)))
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.framing.win_len, 0.025);
        assert_eq!(config.framing.win_hop, 0.010);
        assert_eq!(config.features.lag, 10);
        assert_eq!(config.classify.speech_zcr_threshold, 0.15);
        assert_eq!(config.pitch, PitchBand::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [framing]
            win_len = 0.05

            [features]
            kinds = ["ste", "zero_crossing_rate", "autocorrelation"]

            [pitch]
            f_min = 80.0
            f_max = 300.0
        "#,
        )
        .unwrap();
        assert_eq!(config.framing.win_len, 0.05);
        assert_eq!(config.framing.win_hop, 0.010);
        assert_eq!(
            config.features.kinds,
            vec![
                FeatureKind::ShortTimeEnergy,
                FeatureKind::ZeroCrossingRate,
                FeatureKind::Autocorrelation
            ]
        );
        assert_eq!(config.classify.silence_threshold, 0.01);
        assert_eq!(config.pitch.f_max, 300.0);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.framing.win_hop = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.classify.silence_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.framing.win_hop = 0.05;
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::ParameterConflict(_))
        ));

        let mut config = Config::default();
        config.pitch = PitchBand { f_min: 400.0, f_max: 50.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sonalyze.toml");
        std::fs::write(&path, "[classify]\nregion_window = 0.5\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.classify.region_window, 0.5);

        std::fs::write(&path, "[classify\n").unwrap();
        assert!(load_config(&path).is_err());
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
