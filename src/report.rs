use std::fmt;

use crate::audio::analysis::AnalysisReport;
use crate::audio::classify::{RegionLabel, Voicing};

/// Human-readable summary of one analysis.
pub fn render_text(name: &str, report: &AnalysisReport, merge_regions: bool) -> String {
    TextReport {
        name,
        report,
        merge_regions,
    }
    .to_string()
}

/// Display adapter behind [`render_text`].
pub struct TextReport<'a> {
    pub name: &'a str,
    pub report: &'a AnalysisReport,
    pub merge_regions: bool,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;

        writeln!(f, "{}", self.name)?;
        writeln!(
            f,
            "  {} samples @ {}Hz ({:.3}s)",
            report.total_samples, report.sample_rate, report.duration
        )?;
        writeln!(
            f,
            "  {} frames of {} samples, step {}, {} samples padding",
            report.num_frames, report.frame_length, report.frame_step, report.padding
        )?;

        writeln!(f, "  features:")?;
        for series in &report.series {
            let (min, max) = series
                .values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let mean = series.mean().unwrap_or(f64::NAN);
            writeln!(
                f,
                "    {:<30} min {:>10.4}  mean {:>10.4}  max {:>10.4}",
                series.kind.name(),
                min,
                mean,
                max
            )?;
        }

        writeln!(f, "  LSTER {:.3}  HZCRR {:.3}", report.lster, report.hzcrr)?;

        let count = |v: Voicing| report.voicing.iter().filter(|&&x| x == v).count();
        writeln!(
            f,
            "  voicing: {} voiced, {} unvoiced, {} silent",
            count(Voicing::Voiced),
            count(Voicing::Unvoiced),
            count(Voicing::Silence)
        )?;

        match &report.pitch {
            Some(track) => match median(track.iter().flatten().copied().collect()) {
                Some(f0) => writeln!(f, "  median f0: {:.1}Hz", f0)?,
                None => writeln!(f, "  median f0: n/a (no voiced frames)")?,
            },
            None => writeln!(f, "  median f0: n/a (frames too short)")?,
        }

        let regions = if self.merge_regions {
            report.regions.merged()
        } else {
            report.regions.clone()
        };
        writeln!(
            f,
            "  regions: {:.2}s speech, {:.2}s music, {:.2}s silence",
            regions.duration_of(RegionLabel::Speech),
            regions.duration_of(RegionLabel::Music),
            regions.duration_of(RegionLabel::Silence)
        )?;
        for region in regions.regions() {
            writeln!(
                f,
                "    {:>9.3}s - {:>9.3}s  {}",
                region.start, region.end, region.label
            )?;
        }

        if let Some(range) = &report.range {
            writeln!(
                f,
                "  range {:.3}s-{:.3}s ({:.0}ms): STE {:.3}  ZCR {:.3}  ACF {:.3}  AMD {:.3}",
                range.start, range.end, range.duration_ms, range.ste, range.zcr, range.acf, range.amd
            )?;
        }

        Ok(())
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    Some(values[values.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::analysis::analyze;
    use crate::audio::decode::AudioData;
    use crate::config::Config;

    #[test]
    fn summary_lists_features_and_regions() {
        let mut samples = vec![0.0f32; 1000];
        for (i, s) in samples[..500].iter_mut().enumerate() {
            *s = if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        let audio = AudioData {
            samples,
            sample_rate: 1000,
        };
        let report = analyze(&audio, &Config::default(), Some((0.0, 0.2))).unwrap();

        let text = render_text("clip.wav", &report, true);
        assert!(text.starts_with("clip.wav\n"));
        assert!(text.contains("short_time_energy"));
        assert!(text.contains("zero_crossing_rate"));
        assert!(text.contains("0.50s speech"));
        assert!(text.contains("0.50s silence"));
        assert!(text.contains("range 0.000s-0.200s"));

        // merged: one speech span, one silence span
        let region_lines = text.lines().filter(|l| l.contains("s - ")).count();
        assert_eq!(region_lines, 2);
    }

    #[test]
    fn display_matches_render_text() {
        let samples: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let audio = AudioData {
            samples,
            sample_rate: 1000,
        };
        let report = analyze(&audio, &Config::default(), None).unwrap();
        let wrapped = TextReport {
            name: "tone.wav",
            report: &report,
            merge_regions: false,
        };
        let text = format!("{}", wrapped);
        assert_eq!(text, render_text("tone.wav", &report, false));
        assert_eq!(text.lines().filter(|l| l.contains("s - ")).count(), 10);
        assert!(!text.contains("range "));
    }

    #[test]
    fn median_of_values() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
    }
}
