//! Headerless PCM16 clip format.

use std::time::Duration;

use super::{decode_pcm16, PcmError};

/// Bytes per little-endian `i16` sample.
const SAMPLE_BYTES: usize = 2;

/// A mono, 16-bit little-endian PCM clip at a fixed rate.
///
/// Uploads carry no header, so the format is agreed out of band and the
/// receiver decodes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Format {
    pub const fn mono(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// 16kHz mono, the rate the classifier expects.
    pub const MONO_16K: Format = Format::mono(16000);

    /// Returns the number of whole samples in `bytes` bytes.
    pub fn samples(&self, bytes: usize) -> usize {
        bytes / SAMPLE_BYTES
    }

    /// Returns the playback duration of `bytes` bytes.
    pub fn duration(&self, bytes: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let samples = self.samples(bytes) as u64;
        Duration::from_micros(samples * 1_000_000 / self.sample_rate as u64)
    }

    /// Decodes a clip in this format into normalized samples.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<f32>, PcmError> {
        decode_pcm16(data)
    }
}
