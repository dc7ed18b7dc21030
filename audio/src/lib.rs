//! Audio utilities for short voice clips.
//!
//! - `pcm`: 16-bit little-endian PCM decoding and the [`Format`] descriptor
//! - `trim`: leading and trailing silence removal
//!
//! # Example
//!
//! ```rust
//! use vocal_audio::pcm::{self, Format};
//! use vocal_audio::trim::{trim, TrimConfig};
//! use std::time::Duration;
//!
//! let bytes = vec![0u8; 3200];
//! assert_eq!(Format::MONO_16K.duration(bytes.len()), Duration::from_millis(100));
//!
//! let samples = pcm::decode_pcm16(&bytes).unwrap();
//! let voiced = trim(&samples, &TrimConfig::default());
//! assert_eq!(voiced.len(), samples.len());
//! ```

pub mod pcm;
pub mod trim;

pub use pcm::{Format, PcmError};
