//! End-to-end checks of the frame analysis engine on synthetic signals.

use sonalyze::audio::features::{self, short_time_energy, zero_crossing_rate};
use sonalyze::audio::normalize;
use sonalyze::{
    classify_regions, extract_series, frame, high_zero_crossing_rate_ratio, is_silent,
    low_short_time_energy_ratio, AnalysisError, FeatureKind, FeatureParams, RegionLabel,
    RegionThresholds,
};

fn alternating(n: usize) -> Vec<f32> {
    (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
}

/// Deterministic pseudo-random samples in [-1, 1).
fn noise(n: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 23) as f32 - 1.0
        })
        .collect()
}

#[test]
fn alternating_signal_is_all_speech() {
    let signal = alternating(1000);
    let frames = frame(&signal, 1000, 0.1, 0.1).unwrap();
    assert_eq!(frames.len(), 10);
    assert_eq!(frames.frame_length(), 100);

    for f in frames.iter() {
        assert_eq!(short_time_energy(f).unwrap(), 1.0);
        // one fewer sign change than samples
        assert!((zero_crossing_rate(f).unwrap() - 0.99).abs() < 1e-9);
        assert!(!is_silent(f, 0.01).unwrap());
    }

    let zcr = extract_series(&frames, FeatureKind::ZeroCrossingRate, &FeatureParams::default()).unwrap();
    let thresholds = RegionThresholds {
        silence: 0.01,
        speech_zcr: 0.15,
    };
    let partition = classify_regions(&frames, &zcr, &thresholds).unwrap();
    assert_eq!(partition.len(), 10);
    assert!(partition.regions().iter().all(|r| r.label == RegionLabel::Speech));
    assert_eq!(partition.regions()[9].end, 1.0);
    assert_eq!(partition.merged().len(), 1);
}

#[test]
fn zero_signal_is_silent_and_cannot_be_normalized() {
    // 100-sample windows, as in the alternating case
    let signal = vec![0.0f32; 500];
    let frames = frame(&signal, 500, 0.2, 0.2).unwrap();
    assert_eq!(frames.frame_length(), 100);
    assert_eq!(frames.len(), 5);
    for f in frames.iter() {
        assert!(is_silent(f, 0.01).unwrap());
    }
    assert!(matches!(
        normalize::scale(&signal),
        Err(AnalysisError::InvalidInput(_))
    ));
}

#[test]
fn normalized_peak_is_one() {
    for seed in 1..20 {
        let raw: Vec<f32> = noise(257, seed).iter().map(|s| s * seed as f32 * 1000.0).collect();
        let scaled = normalize::scale(&raw).unwrap();
        let peak = scaled.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert_eq!(peak, 1.0);
        for (r, s) in raw.iter().zip(&scaled) {
            assert!(r.signum() == s.signum() || *r == 0.0);
        }
    }
}

#[test]
fn framing_covers_every_sample() {
    let signal = noise(4567, 7);
    for (sr, len, hop) in [(16000, 0.025, 0.01), (8000, 0.032, 0.016), (44100, 0.02, 0.02)] {
        let frames = frame(&signal, sr, len, hop).unwrap();
        let step = frames.frame_step();
        let coverage = (frames.len() - 1) * step + frames.frame_length();
        assert!(coverage >= signal.len());
        assert!(coverage - signal.len() < step.max(frames.frame_length()));

        let mut rebuilt = vec![f32::NAN; coverage];
        for (i, f) in frames.iter().enumerate() {
            rebuilt[i * step..i * step + f.len()].copy_from_slice(f);
        }
        assert_eq!(&rebuilt[..signal.len()], signal.as_slice());
        assert!(rebuilt[signal.len()..].iter().all(|&s| s == 0.0));
    }
}

#[test]
fn ratios_over_real_series_are_bounded() {
    let mut signal = noise(8000, 3);
    // a quiet stretch makes the energy bursty
    signal[2000..5000].iter_mut().for_each(|s| *s *= 0.01);
    let frames = frame(&signal, 8000, 0.025, 0.01).unwrap();
    let params = FeatureParams::default();

    let ste = extract_series(&frames, FeatureKind::ShortTimeEnergy, &params).unwrap();
    let zcr = extract_series(&frames, FeatureKind::ZeroCrossingRate, &params).unwrap();
    let lster = low_short_time_energy_ratio(&ste).unwrap();
    let hzcrr = high_zero_crossing_rate_ratio(&zcr).unwrap();

    assert!(lster > 0.3 && lster <= 1.0, "lster = {}", lster);
    assert!((0.0..=1.0).contains(&hzcrr));
}

#[test]
fn acf_at_zero_lag_matches_energy() {
    let signal = noise(1000, 11);
    let frames = frame(&signal, 1000, 0.05, 0.02).unwrap();
    for f in frames.iter() {
        let acf = features::autocorrelation(f, 0).unwrap();
        let ste = short_time_energy(f).unwrap();
        assert!((acf - ste * f.len() as f64).abs() < 1e-9);
    }
}

#[test]
fn pitch_of_periodic_frame() {
    let rate = 16000;
    let period = 100;
    let samples: Vec<f32> = (0..2048)
        .map(|i| (2.0 * std::f32::consts::PI * i as f32 / period as f32).sin())
        .collect();
    let f0 = sonalyze::fundamental_frequency(&samples, rate).unwrap();
    let expected = rate as f64 / period as f64;
    assert!((f0 - expected).abs() <= rate as f64 / (period - 1) as f64 - expected);
}
