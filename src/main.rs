mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};

use cli::Cli;
use sonalyze::config::{self, Config};
use sonalyze::report::render_text;
use sonalyze::{analyze, decode_audio, AnalysisReport};

#[derive(Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate().context("Invalid analysis settings")?;

    for input in &cli.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    log::info!(
        "Frames: {:.3}s window, {:.3}s hop, lag {}",
        config.framing.win_len,
        config.framing.win_hop,
        config.features.lag
    );

    let pb = if cli.inputs.len() > 1 {
        let pb = ProgressBar::new(cli.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)")
                .context("Invalid progress bar template")?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut reports: Vec<(PathBuf, AnalysisReport)> = Vec::with_capacity(cli.inputs.len());
    let mut failures = 0usize;

    for input in &cli.inputs {
        match analyze_file(input, &config, cli.range) {
            Ok(report) => reports.push((input.clone(), report)),
            Err(err) => {
                log::error!("{}: {:#}", input.display(), err);
                failures += 1;
            }
        }
        if let Some(ref pb) = pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Analysis complete");
    }

    if cli.json {
        let files: Vec<FileReport> = reports
            .iter()
            .map(|(file, report)| FileReport { file, report })
            .collect();
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for (file, report) in &reports {
            print!("{}", render_text(&file.display().to_string(), report, cli.merge_regions));
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, cli.inputs.len());
    }
    Ok(())
}

fn analyze_file(path: &Path, config: &Config, range: Option<(f64, f64)>) -> Result<AnalysisReport> {
    log::info!("Analyzing {}", path.display());
    let audio = decode_audio(path)?;
    analyze(&audio, config, range).with_context(|| format!("Failed to analyze {}", path.display()))
}

/// Explicit `--config`, else `./sonalyze.toml`, else the user's config directory.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let cfg = config::load_config(path)?;
        log::info!("Loaded config from {}", path.display());
        return Ok(cfg);
    }

    let discovered = {
        let local = PathBuf::from("sonalyze.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs::home_dir()
                .map(|home| home.join(".config").join("sonalyze").join("config.toml"))
                .filter(|p| p.exists())
                .or_else(|| {
                    dirs::config_dir()
                        .map(|dir| dir.join("sonalyze").join("config.toml"))
                        .filter(|p| p.exists())
                })
        }
    };

    match discovered {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                Ok(cfg)
            }
            Err(err) => {
                log::warn!("Ignoring config {}: {:#}", path.display(), err);
                Ok(Config::default())
            }
        },
        None => Ok(Config::default()),
    }
}
