use rayon::prelude::*;

use crate::error::{AnalysisError, Result};

/// A signal split into uniform, possibly overlapping frames.
///
/// Frames are index-range views into one zero-padded buffer owned by the
/// set. Frame `i` starts at sample `i * frame_step` of that buffer and is
/// exactly `frame_length` samples long.
#[derive(Clone, Debug)]
pub struct FrameSet {
    buffer: Vec<f32>,
    frame_length: usize,
    frame_step: usize,
    num_frames: usize,
    signal_length: usize,
    sample_rate: u32,
}

/// Split `signal` into frames of `win_len` seconds spaced `win_hop` seconds apart.
///
/// The tail is zero-padded so that no sample is dropped. A hop longer than
/// the window is accepted (frames then leave gaps) but logged, since most
/// consumers expect overlapping frames.
pub fn frame(signal: &[f32], sample_rate: u32, win_len: f64, win_hop: f64) -> Result<FrameSet> {
    if win_len < win_hop {
        log::warn!(
            "Frame hop ({:.4}s) exceeds frame length ({:.4}s); frames will not overlap",
            win_hop,
            win_len
        );
    }
    let frame_length = seconds_to_samples(win_len, sample_rate, "win_len")?;
    let frame_step = seconds_to_samples(win_hop, sample_rate, "win_hop")?;
    frame_samples(signal, sample_rate, frame_length, frame_step)
}

/// Same as [`frame`] with the window and hop given directly in samples.
pub fn frame_samples(
    signal: &[f32],
    sample_rate: u32,
    frame_length: usize,
    frame_step: usize,
) -> Result<FrameSet> {
    if signal.is_empty() {
        return Err(AnalysisError::input("cannot frame an empty signal"));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::input("sample rate must be positive"));
    }
    if frame_length == 0 || frame_step == 0 {
        return Err(AnalysisError::input(format!(
            "frame length and step must be at least one sample (got {} and {})",
            frame_length, frame_step
        )));
    }

    let (num_frames, padding) = frame_layout(signal.len(), frame_length, frame_step)?;
    let padded_length = signal.len() + padding;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(padded_length).map_err(|e| {
        AnalysisError::input(format!(
            "cannot allocate {} padded samples for framing: {}",
            padded_length, e
        ))
    })?;
    buffer.extend_from_slice(signal);
    buffer.resize(padded_length, 0.0);

    log::debug!(
        "Framed {} samples into {} frames (length={}, step={}, padding={})",
        signal.len(),
        num_frames,
        frame_length,
        frame_step,
        padding
    );

    Ok(FrameSet {
        buffer,
        frame_length,
        frame_step,
        num_frames,
        signal_length: signal.len(),
        sample_rate,
    })
}

/// Number of frames and zero samples of right padding for a signal of
/// `signal_length` samples. Fails when a length or step is zero, or when the
/// padded length does not fit in `usize`.
pub fn frame_layout(signal_length: usize, frame_length: usize, frame_step: usize) -> Result<(usize, usize)> {
    if frame_length == 0 || frame_step == 0 {
        return Err(AnalysisError::input("frame length and step must be non-zero"));
    }
    let num_frames = if signal_length <= frame_length {
        1
    } else {
        (signal_length - frame_length).div_ceil(frame_step) + 1
    };
    let padded_length = (num_frames - 1)
        .checked_mul(frame_step)
        .and_then(|span| span.checked_add(frame_length))
        .ok_or_else(|| {
            AnalysisError::input(format!(
                "{} frames of length {} and step {} overflow the addressable length",
                num_frames, frame_length, frame_step
            ))
        })?;
    Ok((num_frames, padded_length.saturating_sub(signal_length)))
}

fn seconds_to_samples(seconds: f64, sample_rate: u32, name: &str) -> Result<usize> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(AnalysisError::input(format!(
            "{} must be a positive number of seconds (got {})",
            name, seconds
        )));
    }
    if sample_rate == 0 {
        return Err(AnalysisError::input("sample rate must be positive"));
    }
    let samples = (seconds * sample_rate as f64).round();
    if samples < 1.0 {
        return Err(AnalysisError::input(format!(
            "{} of {}s is shorter than one sample at {}Hz",
            name, seconds, sample_rate
        )));
    }
    // usize::MAX as f64 rounds up to 2^64, so equality is out of range too
    if samples >= usize::MAX as f64 {
        return Err(AnalysisError::input(format!(
            "{} of {}s is too long at {}Hz",
            name, seconds, sample_rate
        )));
    }
    Ok(samples as usize)
}

impl FrameSet {
    pub fn len(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn frame_step(&self) -> usize {
        self.frame_step
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length of the original, unpadded signal.
    pub fn signal_length(&self) -> usize {
        self.signal_length
    }

    /// Zero samples appended after the original signal.
    pub fn padding(&self) -> usize {
        self.buffer.len() - self.signal_length
    }

    /// Frame duration in seconds.
    pub fn frame_duration(&self) -> f64 {
        self.frame_length as f64 / self.sample_rate as f64
    }

    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        if index >= self.num_frames {
            return None;
        }
        let start = index * self.frame_step;
        Some(&self.buffer[start..start + self.frame_length])
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        (0..self.num_frames).map(move |i| {
            let start = i * self.frame_step;
            &self.buffer[start..start + self.frame_length]
        })
    }

    /// Parallel counterpart of [`FrameSet::iter`]; yields frames in order.
    pub fn par_iter(&self) -> impl IndexedParallelIterator<Item = &[f32]> + '_ {
        (0..self.num_frames).into_par_iter().map(move |i| {
            let start = i * self.frame_step;
            &self.buffer[start..start + self.frame_length]
        })
    }

    /// Start of frame `index` in seconds from the beginning of the signal.
    pub fn frame_start_time(&self, index: usize) -> f64 {
        (index * self.frame_step) as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Padding rule of the stride-based framer this replaces: pad up to the
    /// next multiple of the step past the overlap. Only meaningful when the
    /// signal is at least one frame long.
    fn modulo_layout(signal_length: usize, frame_length: usize, frame_step: usize) -> (usize, usize) {
        let n = signal_length as i64;
        let len = frame_length as i64;
        let step = frame_step as i64;
        let overlap = len - step;
        let rest = (n - overlap).abs() % (len - overlap).abs();
        let pad = if rest != 0 { step - rest } else { 0 };
        let rows = (n + pad - len) / step + 1;
        (rows as usize, pad as usize)
    }

    #[test]
    fn layout_matches_modulo_padding() {
        for frame_length in 1..40 {
            for frame_step in 1..40 {
                for signal_length in frame_length..frame_length + 90 {
                    assert_eq!(
                        frame_layout(signal_length, frame_length, frame_step).unwrap(),
                        modulo_layout(signal_length, frame_length, frame_step),
                        "n={} len={} step={}",
                        signal_length,
                        frame_length,
                        frame_step
                    );
                }
            }
        }
    }

    #[test]
    fn short_signal_is_one_padded_frame() {
        let frames = frame_samples(&[1.0, 2.0, 3.0], 10, 5, 2).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames.padding(), 2);
        assert_eq!(frames.frame(0).unwrap(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn overlapping_frames_have_exact_offsets() {
        let signal: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let frames = frame_samples(&signal, 1, 4, 3).unwrap();
        // ceil((10 - 4) / 3) + 1
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.padding(), 0);
        assert_eq!(frames.frame(1).unwrap(), &[3.0, 4.0, 5.0, 6.0]);
        assert_eq!(frames.frame(2).unwrap(), &[6.0, 7.0, 8.0, 9.0]);
        assert!(frames.frame(3).is_none());
    }

    #[test]
    fn frames_reconstruct_signal() {
        let signal: Vec<f32> = (1..=103).map(|i| i as f32).collect();
        for (len, step) in [(10, 10), (10, 3), (7, 11), (25, 10)] {
            let frames = frame_samples(&signal, 100, len, step).unwrap();
            let coverage = (frames.len() - 1) * step + len;
            assert!(coverage >= signal.len());

            for (i, f) in frames.iter().enumerate() {
                assert_eq!(f.len(), len);
                for (j, &s) in f.iter().enumerate() {
                    let pos = i * step + j;
                    if pos < signal.len() {
                        assert_eq!(s, signal[pos]);
                    } else {
                        assert_eq!(s, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn seconds_are_rounded_to_samples() {
        let signal = vec![0.5f32; 1000];
        let frames = frame(&signal, 16000, 0.025, 0.01).unwrap();
        assert_eq!(frames.frame_length(), 400);
        assert_eq!(frames.frame_step(), 160);
        assert_eq!(frames.frame_start_time(2), 0.02);
    }

    #[test]
    fn hop_longer_than_window_is_allowed() {
        let signal = vec![1.0f32; 50];
        let frames = frame(&signal, 100, 0.05, 0.1).unwrap();
        assert_eq!(frames.frame_length(), 5);
        assert_eq!(frames.frame_step(), 10);
        assert_eq!(frames.len(), 6);
    }

    #[test]
    fn rejects_bad_parameters() {
        let signal = vec![1.0f32; 10];
        assert!(matches!(frame(&[], 100, 0.1, 0.1), Err(AnalysisError::InvalidInput(_))));
        assert!(frame(&signal, 0, 0.1, 0.1).is_err());
        assert!(frame(&signal, 100, 0.0, 0.1).is_err());
        assert!(frame(&signal, 100, 0.1, -0.1).is_err());
        assert!(frame(&signal, 100, f64::NAN, 0.1).is_err());
        assert!(frame(&signal, 100, 0.001, 0.1).is_err());
    }

    #[test]
    fn huge_windows_fail_without_panicking() {
        let signal = [0.5f32; 10];
        assert!(matches!(
            frame(&signal, 44100, 1e30, 1e30),
            Err(AnalysisError::InvalidInput(_))
        ));
        // step fits in usize but the padded buffer cannot be allocated
        assert!(matches!(
            frame(&signal, 1, 2.0, 1e19),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            frame_layout(100, 2, usize::MAX),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(frame_layout(10, 0, 1).is_err());
    }
}
