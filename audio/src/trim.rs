//! Leading and trailing silence removal.
//!
//! The signal is split into centered RMS frames (zero padded at both
//! ends). A frame is voiced when its power, in dB relative to the loudest
//! frame, is above `-top_db`. The trimmed clip spans from the first voiced
//! frame to the end of the last one.

use std::ops::Range;

/// Power floor before taking logarithms.
const AMIN: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimConfig {
    /// Threshold below the loudest frame, in dB, under which a frame is silent.
    pub top_db: f64,
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            top_db: 60.0,
            frame_length: 2048,
            hop_length: 512,
        }
    }
}

/// Returns the sample range that remains after trimming.
///
/// A signal with no energy has no reference level and is returned whole.
/// A zero frame or hop length disables trimming.
pub fn trim_range(samples: &[f32], config: &TrimConfig) -> Range<usize> {
    let n = samples.len();
    if config.frame_length == 0 || config.hop_length == 0 {
        return 0..n;
    }

    let power = frame_power(samples, config.frame_length, config.hop_length);
    let reference = power.iter().copied().fold(0.0f64, f64::max);
    let ref_db = 10.0 * reference.max(AMIN).log10();

    let voiced = |p: &f64| 10.0 * p.max(AMIN).log10() - ref_db > -config.top_db;
    let Some(first) = power.iter().position(voiced) else {
        return 0..0;
    };
    // `position` succeeded, so `rposition` does too.
    let last = power.iter().rposition(voiced).unwrap_or(first);

    let start = (first * config.hop_length).min(n);
    let end = ((last + 1) * config.hop_length).min(n);
    start..end
}

/// Trims leading and trailing silence from `samples`.
pub fn trim<'a>(samples: &'a [f32], config: &TrimConfig) -> &'a [f32] {
    &samples[trim_range(samples, config)]
}

/// Mean power of each centered frame.
fn frame_power(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let n = samples.len();
    let half = frame_length / 2;
    let num_frames = 1 + n / hop_length;

    (0..num_frames)
        .map(|t| {
            let center = t * hop_length;
            let lo = center.saturating_sub(half).min(n);
            let hi = (center + frame_length - half).min(n);
            let sum: f64 = samples[lo..hi].iter().map(|&s| (s as f64) * (s as f64)).sum();
            sum / frame_length as f64
        })
        .collect()
}
