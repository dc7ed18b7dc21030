//! Vowel classification from short mono audio clips.
//!
//! # Architecture
//!
//! The pipeline processes one buffer in three stages:
//!
//! 1. [`FeatureVectorBuilder::build`]: samples in [-1, 1] at 16 kHz -> 56-dim [`FeatureVector`]
//! 2. [`FeatureScaler::transform`]: raw features -> standardized features
//! 3. [`VowelClassifier::predict`]: standardized features -> label + confidence
//!
//! [`ClassificationService`] ties the stages together and holds the
//! loaded parameters for the life of the process.
//!
//! # Feature Extraction
//!
//! The [`features`] module computes:
//! - Spectral shape (centroid, bandwidth, rolloff), formant peaks and
//!   flatness from one Hamming-windowed DFT of the whole buffer
//! - MFCC mean and standard deviation over 2048-sample frames
//! - Zero-crossing rate and RMS energy
//!
//! # Parameters
//!
//! Scaler and classifier parameters are versioned JSON documents holding
//! numeric arrays only. See [`ScalerParameters`] and [`ClassifierParameters`].

pub mod classifier;
mod error;
pub mod features;
mod result;
mod scaler;
mod service;

pub use classifier::{ClassifierParameters, ModelParameters, Prediction, VowelClassifier};
pub use error::VowelError;
pub use features::{
    FeatureExtractor, FeatureVector, FeatureVectorBuilder, MfccConfig, FEATURE_DIM, MIN_SAMPLES,
    SAMPLE_RATE,
};
pub use result::{ClassificationResult, FailureReason};
pub use scaler::{FeatureScaler, ScalerParameters};
pub use service::{ClassificationService, ServiceState};

/// Schema version accepted for scaler and classifier parameter blobs.
pub const PARAMETERS_VERSION: u32 = 1;
