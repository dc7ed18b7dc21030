use rustfft::{num_complex::Complex, FftPlanner};

use super::mel::hamming_window;
use super::peaks::find_peaks;
use super::N_FORMANTS;
use super::FORMANT_SLOTS;

/// Fraction of total magnitude below the rolloff frequency.
const ROLLOFF_FRACTION: f64 = 0.85;

/// Minimum peak height relative to the spectrum maximum.
const PEAK_HEIGHT_RATIO: f64 = 0.1;

/// Minimum distance between formant peaks, in bins.
const PEAK_DISTANCE: usize = 20;

/// Guards the flatness logarithm and denominator.
const FLATNESS_EPSILON: f64 = 1e-9;

/// Frequency-domain statistics of a whole buffer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectralFeatures {
    /// Magnitude-weighted mean frequency in Hz.
    pub centroid: f64,
    /// Magnitude-weighted standard deviation around the centroid in Hz.
    pub bandwidth: f64,
    /// Frequency below which 85% of the magnitude lies, in Hz.
    pub rolloff: f64,
    /// Up to five peak frequencies, descending, zero-padded.
    pub formants: [f64; N_FORMANTS],
    /// Geometric over arithmetic mean of the magnitude spectrum.
    pub flatness: f64,
}

impl SpectralFeatures {
    /// Expands the formants into the vector's formant segment.
    ///
    /// Only five formants are ever found but ten slots are reserved;
    /// the trailing slots are always zero.
    pub fn formant_slots(&self) -> [f64; FORMANT_SLOTS] {
        let mut slots = [0.0f64; FORMANT_SLOTS];
        slots[..N_FORMANTS].copy_from_slice(&self.formants);
        slots
    }
}

/// Computes a single Hamming-windowed DFT over the whole buffer and
/// derives shape statistics from its magnitude.
#[derive(Debug, Clone, Default)]
pub struct SpectralAnalyzer;

impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes the buffer. The input is only read.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> SpectralFeatures {
        let magnitude = magnitude_spectrum(samples);
        if magnitude.is_empty() {
            return SpectralFeatures::default();
        }

        let n = samples.len();
        let freqs: Vec<f64> = (0..magnitude.len())
            .map(|k| k as f64 * sample_rate as f64 / n as f64)
            .collect();

        let total: f64 = magnitude.iter().sum();
        let (centroid, bandwidth, rolloff) = if total > 0.0 {
            shape_statistics(&magnitude, &freqs, total)
        } else {
            (0.0, 0.0, 0.0)
        };

        SpectralFeatures {
            centroid,
            bandwidth,
            rolloff,
            formants: formants(&magnitude, &freqs),
            flatness: flatness(&magnitude),
        }
    }
}

/// Returns the magnitude of the first `floor(N/2)` DFT bins of the
/// Hamming-windowed buffer.
pub(crate) fn magnitude_spectrum(samples: &[f32]) -> Vec<f64> {
    let n = samples.len();
    if n < 2 {
        return Vec::new();
    }

    let window = hamming_window(n);
    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
        .collect();

    let fft = FftPlanner::<f64>::new().plan_fft_forward(n);
    fft.process(&mut buffer);

    buffer[..n / 2].iter().map(|c| c.norm()).collect()
}

fn shape_statistics(magnitude: &[f64], freqs: &[f64], total: f64) -> (f64, f64, f64) {
    let centroid = freqs
        .iter()
        .zip(magnitude)
        .map(|(f, m)| f * m)
        .sum::<f64>()
        / total;

    let variance = freqs
        .iter()
        .zip(magnitude)
        .map(|(f, m)| (f - centroid) * (f - centroid) * m)
        .sum::<f64>()
        / total;

    // First bin whose cumulative magnitude reaches the threshold.
    let threshold = ROLLOFF_FRACTION * total;
    let mut cumulative = 0.0;
    let mut idx = magnitude.len() - 1;
    for (k, &m) in magnitude.iter().enumerate() {
        cumulative += m;
        if cumulative >= threshold {
            idx = k;
            break;
        }
    }

    (centroid, variance.sqrt(), freqs[idx])
}

fn formants(magnitude: &[f64], freqs: &[f64]) -> [f64; N_FORMANTS] {
    let max = magnitude.iter().copied().fold(0.0f64, f64::max);
    let peaks = find_peaks(magnitude, max * PEAK_HEIGHT_RATIO, PEAK_DISTANCE);

    let mut peak_freqs: Vec<f64> = peaks.iter().map(|&p| freqs[p]).collect();
    peak_freqs.sort_by(|a, b| b.total_cmp(a));

    let mut out = [0.0f64; N_FORMANTS];
    for (slot, f) in out.iter_mut().zip(peak_freqs) {
        *slot = f;
    }
    out
}

fn flatness(magnitude: &[f64]) -> f64 {
    let n = magnitude.len() as f64;
    let log_mean = magnitude
        .iter()
        .map(|m| (m + FLATNESS_EPSILON).ln())
        .sum::<f64>()
        / n;
    let mean = magnitude.iter().sum::<f64>() / n;
    log_mean.exp() / (mean + FLATNESS_EPSILON)
}
