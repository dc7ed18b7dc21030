//! 16-bit PCM handling.
//!
//! Clips arrive as raw little-endian `i16` samples with no header. They are
//! decoded to `f32` in [-1, 1) by dividing by 32768.

mod format;

pub use format::Format;

/// Full-scale value of a 16-bit sample.
const FULL_SCALE: f32 = 32768.0;

#[derive(Debug, thiserror::Error)]
pub enum PcmError {
    #[error("PCM16 payload has odd length {0}")]
    OddLength(usize),
}

/// Decodes little-endian signed 16-bit PCM into normalized samples.
pub fn decode_pcm16(data: &[u8]) -> Result<Vec<f32>, PcmError> {
    if data.len() % 2 != 0 {
        return Err(PcmError::OddLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / FULL_SCALE)
        .collect())
}

/// Encodes normalized samples as little-endian signed 16-bit PCM.
///
/// Values outside [-1, 1) are clamped to the 16-bit range.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s * FULL_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        data.extend_from_slice(&v.to_le_bytes());
    }
    data
}
