//! Feature extraction from mono audio buffers.
//!
//! A [`FeatureVectorBuilder`] runs three analyzers over the same buffer and
//! concatenates their outputs into a [`FeatureVector`]:
//!
//! ```text
//! [0..3)   centroid, bandwidth, rolloff      (SpectralAnalyzer)
//! [3..23)  MFCC means                        (CepstralAnalyzer)
//! [23..43) MFCC standard deviations          (CepstralAnalyzer)
//! [43..53) formant slots: top-5 + zero pad   (SpectralAnalyzer)
//! [53..56) zcr, rms, flatness                (Temporal + Spectral)
//! ```
//!
//! The layout is frozen: trained scaler and classifier parameters index
//! into it by position.

mod cepstral;
mod mel;
mod peaks;
mod spectral;
mod temporal;

use std::ops::Range;

use crate::VowelError;

pub use cepstral::{CepstralAnalyzer, CepstralFeatures, MfccConfig};
pub use peaks::find_peaks;
pub use spectral::{SpectralAnalyzer, SpectralFeatures};
pub use temporal::{TemporalAnalyzer, TemporalFeatures};

/// Nominal input sample rate in Hz.
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum buffer length accepted by the pipeline.
pub const MIN_SAMPLES: usize = 2048;

/// Number of cepstral coefficients per frame.
pub const N_MFCC: usize = 20;

/// Number of formants kept from the spectrum.
pub const N_FORMANTS: usize = 5;

/// Number of vector slots reserved for formants.
pub const FORMANT_SLOTS: usize = 10;

/// Total feature vector length.
pub const FEATURE_DIM: usize = 3 + 2 * N_MFCC + FORMANT_SLOTS + 3;

const SPECTRAL_SHAPE: Range<usize> = 0..3;
const MFCC_MEAN: Range<usize> = 3..3 + N_MFCC;
const MFCC_STD: Range<usize> = 3 + N_MFCC..3 + 2 * N_MFCC;
const FORMANTS: Range<usize> = 3 + 2 * N_MFCC..3 + 2 * N_MFCC + FORMANT_SLOTS;
const TEMPORAL: Range<usize> = FEATURE_DIM - 3..FEATURE_DIM;

/// Fixed-length feature vector with named segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_DIM]);

impl FeatureVector {
    /// Assembles a vector from analyzer outputs in the frozen order.
    pub fn from_parts(
        spectral: &SpectralFeatures,
        cepstral: &CepstralFeatures,
        temporal: &TemporalFeatures,
    ) -> Self {
        let mut v = [0.0f64; FEATURE_DIM];
        v[SPECTRAL_SHAPE].copy_from_slice(&[
            spectral.centroid,
            spectral.bandwidth,
            spectral.rolloff,
        ]);
        v[MFCC_MEAN].copy_from_slice(&cepstral.mean);
        v[MFCC_STD].copy_from_slice(&cepstral.std);
        v[FORMANTS].copy_from_slice(&spectral.formant_slots());
        v[TEMPORAL].copy_from_slice(&[temporal.zcr, temporal.rms, spectral.flatness]);
        Self(v)
    }

    /// Wraps raw values that already follow the frozen layout.
    pub fn from_array(values: [f64; FEATURE_DIM]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Centroid, bandwidth and rolloff in Hz.
    pub fn spectral_shape(&self) -> &[f64] {
        &self.0[SPECTRAL_SHAPE]
    }

    pub fn mfcc_mean(&self) -> &[f64] {
        &self.0[MFCC_MEAN]
    }

    pub fn mfcc_std(&self) -> &[f64] {
        &self.0[MFCC_STD]
    }

    /// All formant slots, including the zero padding.
    pub fn formants(&self) -> &[f64] {
        &self.0[FORMANTS]
    }

    /// Zero-crossing rate, RMS energy and spectral flatness.
    pub fn temporal(&self) -> &[f64] {
        &self.0[TEMPORAL]
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Turns a mono audio buffer into a [`FeatureVector`].
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use; the classification
/// service calls them from many requests at once.
pub trait FeatureExtractor: Send + Sync {
    /// Extracts features from samples in [-1, 1] at the given sample rate.
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureVector, VowelError>;
}

/// Default [`FeatureExtractor`] combining the spectral, cepstral and
/// temporal analyzers.
#[derive(Default)]
pub struct FeatureVectorBuilder {
    spectral: SpectralAnalyzer,
    cepstral: CepstralAnalyzer,
    temporal: TemporalAnalyzer,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with a custom MFCC configuration.
    ///
    /// Vectors built this way are only compatible with parameters trained
    /// on the same configuration.
    pub fn with_mfcc_config(cfg: MfccConfig) -> Self {
        Self {
            cepstral: CepstralAnalyzer::new(cfg),
            ..Self::default()
        }
    }

    /// Builds the feature vector for one buffer.
    ///
    /// Fails with [`VowelError::InsufficientAudio`] when the buffer holds
    /// fewer than [`MIN_SAMPLES`] samples.
    pub fn build(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureVector, VowelError> {
        if samples.len() < MIN_SAMPLES {
            return Err(VowelError::InsufficientAudio {
                min_samples: MIN_SAMPLES,
                got_samples: samples.len(),
            });
        }
        if sample_rate == 0 {
            return Err(VowelError::InvalidSampleRate(sample_rate));
        }

        let spectral = self.spectral.analyze(samples, sample_rate);
        let cepstral = self.cepstral.analyze(samples, sample_rate);
        let temporal = self.temporal.analyze(samples);
        Ok(FeatureVector::from_parts(&spectral, &cepstral, &temporal))
    }
}

impl FeatureExtractor for FeatureVectorBuilder {
    fn extract(&self, samples: &[f32], sample_rate: u32) -> Result<FeatureVector, VowelError> {
        self.build(samples, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq_hz: f64, n_samples: usize, amplitude: f64) -> Vec<f32> {
        (0..n_samples)
            .map(|i| {
                let t = i as f64 / SAMPLE_RATE as f64;
                (amplitude * (2.0 * PI * freq_hz * t).sin()) as f32
            })
            .collect()
    }

    #[test]
    fn feature_dim_layout() {
        assert_eq!(FEATURE_DIM, 56);
        assert_eq!(SPECTRAL_SHAPE.end, MFCC_MEAN.start);
        assert_eq!(MFCC_MEAN.end, MFCC_STD.start);
        assert_eq!(MFCC_STD.end, FORMANTS.start);
        assert_eq!(FORMANTS.end, TEMPORAL.start);
        assert_eq!(FORMANTS.len(), FORMANT_SLOTS);
    }

    #[test]
    fn build_rejects_short_buffers() {
        let b = FeatureVectorBuilder::new();
        for len in [0, 1, 100, MIN_SAMPLES - 1] {
            let audio = sine(440.0, len, 0.5);
            match b.build(&audio, SAMPLE_RATE) {
                Err(VowelError::InsufficientAudio {
                    min_samples,
                    got_samples,
                }) => {
                    assert_eq!(min_samples, MIN_SAMPLES);
                    assert_eq!(got_samples, len);
                }
                other => panic!("len {len}: expected InsufficientAudio, got {other:?}"),
            }
        }
    }

    #[test]
    fn build_rejects_zero_sample_rate() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(440.0, MIN_SAMPLES, 0.5);
        assert!(matches!(
            b.build(&audio, 0),
            Err(VowelError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn build_accepts_minimum_length() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(440.0, MIN_SAMPLES, 0.5);
        let v = b.build(&audio, SAMPLE_RATE).unwrap();
        assert_eq!(v.as_slice().len(), FEATURE_DIM);
        assert!(v.as_slice().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn sine_200hz_centroid() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(200.0, SAMPLE_RATE as usize, 0.5);
        let v = b.build(&audio, SAMPLE_RATE).unwrap();
        let centroid = v.spectral_shape()[0];
        assert!(
            (centroid - 200.0).abs() < 20.0,
            "centroid should be near 200 Hz, got {centroid}"
        );
    }

    #[test]
    fn silence_vector() {
        let b = FeatureVectorBuilder::new();
        let audio = vec![0.0f32; 4096];
        let v = b.build(&audio, SAMPLE_RATE).unwrap();
        assert_eq!(v.spectral_shape(), &[0.0, 0.0, 0.0]);
        assert!(v.formants().iter().all(|&f| f == 0.0));
        // rms is zero; zcr counts only the padded first sample.
        assert_eq!(v.temporal()[1], 0.0);
        assert!((v.temporal()[0] - 1.0 / 4096.0).abs() < 1e-12);
        assert!(v.as_slice().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn formant_slots_padded() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(300.0, SAMPLE_RATE as usize, 0.5);
        let v = b.build(&audio, SAMPLE_RATE).unwrap();
        let formants = v.formants();
        assert_eq!(formants.len(), FORMANT_SLOTS);
        let nonzero: Vec<f64> = formants.iter().copied().filter(|&f| f != 0.0).collect();
        assert!(!nonzero.is_empty());
        assert!(nonzero.len() <= N_FORMANTS);
        assert!(nonzero.windows(2).all(|w| w[0] >= w[1]));
        assert!(formants[N_FORMANTS..].iter().all(|&f| f == 0.0));
    }

    #[test]
    fn build_is_deterministic() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(523.0, 8000, 0.3);
        let v1 = b.build(&audio, SAMPLE_RATE).unwrap();
        let v2 = b.build(&audio, SAMPLE_RATE).unwrap();
        assert_eq!(v1, v2);
    }

    #[test]
    fn build_does_not_mutate_input() {
        let b = FeatureVectorBuilder::new();
        let audio = sine(220.0, 4096, 0.4);
        let before = audio.clone();
        b.build(&audio, SAMPLE_RATE).unwrap();
        assert_eq!(audio, before);
    }
}
