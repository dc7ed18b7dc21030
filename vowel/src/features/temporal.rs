/// Magnitudes at or below this are treated as exact zeros when counting
/// sign changes.
const ZERO_THRESHOLD: f32 = 1e-10;

/// Time-domain statistics of a whole buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemporalFeatures {
    /// Fraction of samples at which the sign changes.
    pub zcr: f64,
    /// Root-mean-square amplitude.
    pub rms: f64,
}

/// Computes zero-crossing rate and RMS energy.
#[derive(Debug, Clone, Default)]
pub struct TemporalAnalyzer;

impl TemporalAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the buffer. Returns zeros for an empty buffer.
    pub fn analyze(&self, samples: &[f32]) -> TemporalFeatures {
        if samples.is_empty() {
            return TemporalFeatures::default();
        }
        TemporalFeatures {
            zcr: zero_crossing_rate(samples),
            rms: rms(samples),
        }
    }
}

/// Mean of the per-sample crossing indicator.
///
/// Zero counts as positive. The indicator has one entry per sample; the
/// first entry has no predecessor and is always set.
fn zero_crossing_rate(samples: &[f32]) -> f64 {
    let negative = |s: f32| s.abs() > ZERO_THRESHOLD && s < 0.0;
    let crossings = samples
        .windows(2)
        .filter(|w| negative(w[0]) != negative(w[1]))
        .count();
    (crossings + 1) as f64 / samples.len() as f64
}

fn rms(samples: &[f32]) -> f64 {
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}
