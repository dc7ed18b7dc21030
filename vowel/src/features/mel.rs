use std::f64::consts::PI;

/// Symmetric Hamming window: `0.54 - 0.46 cos(2 pi n / (N - 1))`.
pub(crate) fn hamming_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Periodic Hann window, the DFT-even variant used for STFT frames.
pub(crate) fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

// Slaney mel scale: linear below 1 kHz, logarithmic above.
const MEL_F_SP: f64 = 200.0 / 3.0;
const MEL_MIN_LOG_HZ: f64 = 1000.0;
const MEL_MIN_LOG_MEL: f64 = MEL_MIN_LOG_HZ / MEL_F_SP;

fn mel_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MEL_MIN_LOG_HZ {
        MEL_MIN_LOG_MEL + (hz / MEL_MIN_LOG_HZ).ln() / mel_log_step()
    } else {
        hz / MEL_F_SP
    }
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MEL_MIN_LOG_MEL {
        MEL_MIN_LOG_HZ * (mel_log_step() * (mel - MEL_MIN_LOG_MEL)).exp()
    } else {
        MEL_F_SP * mel
    }
}

/// Computes Slaney-normalized triangular mel filters.
/// Returns `[num_mels][n_fft / 2 + 1]` weights.
pub(crate) fn mel_filterbank(
    num_mels: usize,
    n_fft: usize,
    sample_rate: f64,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = n_fft / 2 + 1;

    // Center frequency of each FFT bin.
    let fft_freqs: Vec<f64> = (0..half_fft)
        .map(|k| k as f64 * sample_rate / n_fft as f64)
        .collect();

    // Equally spaced mel points, converted back to Hz.
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);
    let mel_freqs: Vec<f64> = (0..num_mels + 2)
        .map(|i| mel_to_hz(mel_low + i as f64 * (mel_high - mel_low) / (num_mels + 1) as f64))
        .collect();

    let mut fb = Vec::with_capacity(num_mels);
    for m in 0..num_mels {
        let (left, center, right) = (mel_freqs[m], mel_freqs[m + 1], mel_freqs[m + 2]);
        let enorm = 2.0 / (right - left);
        let filter = fft_freqs
            .iter()
            .map(|&f| {
                let lower = (f - left) / (center - left);
                let upper = (right - f) / (right - center);
                lower.min(upper).max(0.0) * enorm
            })
            .collect();
        fb.push(filter);
    }
    fb
}

/// Orthonormal DCT-II of `x`, truncated to the first `n_out` coefficients.
pub(crate) fn dct_ortho(x: &[f64], n_out: usize) -> Vec<f64> {
    let n = x.len() as f64;
    (0..n_out)
        .map(|k| {
            let sum: f64 = x
                .iter()
                .enumerate()
                .map(|(i, &v)| v * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos())
                .sum();
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            sum * scale
        })
        .collect()
}

/// Floor for power values before taking the logarithm.
pub(crate) const POWER_FLOOR: f64 = 1e-10;

/// Converts power to decibels relative to 1.0.
pub(crate) fn power_to_db(power: f64) -> f64 {
    10.0 * power.max(POWER_FLOOR).log10()
}
