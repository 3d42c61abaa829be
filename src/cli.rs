use clap::Parser;
use sonalyze::{Config, FeatureKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sonalyze", about = "Frame-based time-domain audio analysis")]
pub struct Cli {
    /// Input audio files (mono WAV, FLAC, MP3, OGG)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Config file (defaults to ./sonalyze.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frame length in seconds
    #[arg(long)]
    pub win_len: Option<f64>,

    /// Step between frames in seconds
    #[arg(long)]
    pub win_hop: Option<f64>,

    /// Lag in samples for autocorrelation and AMD
    #[arg(short, long)]
    pub lag: Option<usize>,

    /// Features to extract (comma-separated): ste, volume, zcr, acf, amd, f0
    #[arg(short, long, value_delimiter = ',')]
    pub feature: Vec<FeatureKind>,

    /// Mean absolute amplitude at or below which a frame is silent
    #[arg(long)]
    pub silence_threshold: Option<f64>,

    /// ZCR above which a non-silent region is speech
    #[arg(long)]
    pub speech_threshold: Option<f64>,

    /// ZCR below which a non-silent frame is voiced
    #[arg(long)]
    pub voiced_threshold: Option<f64>,

    /// Region length in seconds for speech/music labelling
    #[arg(long)]
    pub region_window: Option<f64>,

    /// Measure the slice between two time marks in seconds, e.g. 0.5,1.2
    #[arg(long, value_parser = parse_range)]
    pub range: Option<(f64, f64)>,

    /// Coalesce neighbouring regions with the same label
    #[arg(long)]
    pub merge_regions: bool,

    /// Print the full reports as a JSON array, one entry per input
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Values given on the command line take precedence over the config file.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(v) = self.win_len { config.framing.win_len = v; }
        if let Some(v) = self.win_hop { config.framing.win_hop = v; }
        if let Some(v) = self.lag { config.features.lag = v; }
        if !self.feature.is_empty() {
            config.features.kinds = self.feature.clone();
        }
        if let Some(v) = self.silence_threshold { config.classify.silence_threshold = v; }
        if let Some(v) = self.speech_threshold { config.classify.speech_zcr_threshold = v; }
        if let Some(v) = self.voiced_threshold { config.classify.voiced_zcr_threshold = v; }
        if let Some(v) = self.region_window { config.classify.region_window = v; }
    }
}

fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected START,END but got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid time '{}': {}", v.trim(), e))
    };
    Ok((parse(a)?, parse(b)?))
}
