use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::mel::{dct_ortho, hann_window, mel_filterbank, power_to_db};
use super::N_MFCC;

/// Configures MFCC extraction.
///
/// The defaults are what existing trained parameters expect: 2048-point
/// frames every 512 samples, centered with zero padding, a periodic Hann
/// window, 128 Slaney mel bands over `[0, sr/2]`, dB conversion clipped
/// 80 dB below the loudest cell, and an orthonormal DCT-II.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    /// FFT and frame length in samples (default: 2048).
    pub n_fft: usize,
    /// Frame shift in samples (default: 512).
    pub hop_length: usize,
    /// Number of mel bands (default: 128).
    pub n_mels: usize,
    /// Lowest mel band edge in Hz (default: 0).
    pub f_min: f64,
    /// Highest mel band edge in Hz, `None` = Nyquist (default: None).
    pub f_max: Option<f64>,
    /// Dynamic range kept below the maximum, in dB (default: Some(80)).
    pub top_db: Option<f64>,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            f_min: 0.0,
            f_max: None,
            top_db: Some(80.0),
        }
    }
}

/// Per-coefficient MFCC statistics across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CepstralFeatures {
    pub mean: [f64; N_MFCC],
    /// Population standard deviation.
    pub std: [f64; N_MFCC],
}

/// Computes frame-wise MFCCs and reduces them to mean and standard deviation.
pub struct CepstralAnalyzer {
    cfg: MfccConfig,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl Default for CepstralAnalyzer {
    fn default() -> Self {
        Self::new(MfccConfig::default())
    }
}

impl CepstralAnalyzer {
    /// Creates an analyzer. Zero sizes fall back to the defaults.
    pub fn new(cfg: MfccConfig) -> Self {
        let defaults = MfccConfig::default();
        let cfg = MfccConfig {
            n_fft: if cfg.n_fft >= 2 { cfg.n_fft } else { defaults.n_fft },
            hop_length: if cfg.hop_length > 0 {
                cfg.hop_length
            } else {
                defaults.hop_length
            },
            n_mels: if cfg.n_mels >= N_MFCC {
                cfg.n_mels
            } else {
                defaults.n_mels
            },
            ..cfg
        };
        let window = hann_window(cfg.n_fft);
        let fft = FftPlanner::<f64>::new().plan_fft_forward(cfg.n_fft);
        Self { cfg, window, fft }
    }

    pub fn config(&self) -> &MfccConfig {
        &self.cfg
    }

    /// Analyzes the buffer. The input is only read.
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> CepstralFeatures {
        let frames = self.mfcc_frames(samples, sample_rate);
        reduce(&frames)
    }

    /// Returns `[num_frames][N_MFCC]` coefficients, with
    /// `num_frames = 1 + len / hop_length` for an even `n_fft`.
    ///
    /// An odd `n_fft` pads one sample short of a full frame, so an empty
    /// buffer yields no frames.
    pub fn mfcc_frames(&self, samples: &[f32], sample_rate: u32) -> Vec<[f64; N_MFCC]> {
        let cfg = &self.cfg;
        let sr = sample_rate as f64;
        let half_fft = cfg.n_fft / 2 + 1;
        let f_max = cfg.f_max.unwrap_or(sr / 2.0);
        let filterbank = mel_filterbank(cfg.n_mels, cfg.n_fft, sr, cfg.f_min, f_max);

        // Center frames by zero-padding half a frame on each side.
        let pad = cfg.n_fft / 2;
        let mut padded = vec![0.0f64; samples.len() + 2 * pad];
        for (dst, &s) in padded[pad..].iter_mut().zip(samples) {
            *dst = s as f64;
        }
        if padded.len() < cfg.n_fft {
            return Vec::new();
        }
        let num_frames = (padded.len() - cfg.n_fft) / cfg.hop_length + 1;

        let mut buf = vec![Complex::new(0.0f64, 0.0); cfg.n_fft];
        let mut scratch = vec![Complex::new(0.0f64, 0.0); self.fft.get_inplace_scratch_len()];
        let mut power = vec![0.0f64; half_fft];
        let mut log_mel = Vec::with_capacity(num_frames);
        let mut max_db = f64::NEG_INFINITY;

        for f in 0..num_frames {
            let offset = f * cfg.hop_length;
            let frame = &padded[offset..offset + cfg.n_fft];
            for ((b, &s), &w) in buf.iter_mut().zip(frame).zip(&self.window) {
                *b = Complex::new(s * w, 0.0);
            }
            self.fft.process_with_scratch(&mut buf, &mut scratch);
            for (p, c) in power.iter_mut().zip(&buf) {
                *p = c.norm_sqr();
            }

            let mut bands = vec![0.0f64; cfg.n_mels];
            for (band, filter) in bands.iter_mut().zip(&filterbank) {
                let energy: f64 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                *band = power_to_db(energy);
                max_db = max_db.max(*band);
            }
            log_mel.push(bands);
        }

        if let Some(top_db) = self.cfg.top_db {
            let floor = max_db - top_db;
            for v in log_mel.iter_mut().flatten() {
                *v = v.max(floor);
            }
        }

        log_mel
            .iter()
            .map(|bands| {
                let mut coeffs = [0.0f64; N_MFCC];
                coeffs.copy_from_slice(&dct_ortho(bands, N_MFCC));
                coeffs
            })
            .collect()
    }
}

fn reduce(frames: &[[f64; N_MFCC]]) -> CepstralFeatures {
    let mut mean = [0.0f64; N_MFCC];
    let mut std = [0.0f64; N_MFCC];
    if frames.is_empty() {
        return CepstralFeatures { mean, std };
    }

    let t = frames.len() as f64;
    for c in 0..N_MFCC {
        let m = frames.iter().map(|f| f[c]).sum::<f64>() / t;
        let var = frames.iter().map(|f| (f[c] - m) * (f[c] - m)).sum::<f64>() / t;
        mean[c] = m;
        std[c] = var.sqrt();
    }
    CepstralFeatures { mean, std }
}
