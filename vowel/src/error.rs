use thiserror::Error;

use crate::result::FailureReason;

/// Errors returned by vowel classification operations.
#[derive(Debug, Error)]
pub enum VowelError {
    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    InsufficientAudio {
        min_samples: usize,
        got_samples: usize,
    },

    #[error("model unavailable: no trained parameters loaded")]
    ModelUnavailable,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("parse parameters: {0}")]
    Json(#[from] serde_json::Error),

    #[error("read parameters: {0}")]
    Io(#[from] std::io::Error),
}

impl VowelError {
    /// Maps the error onto the reason reported across the classification boundary.
    ///
    /// Load-time errors leave a service untrained, so they report as
    /// [`FailureReason::ModelUnavailable`].
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::InsufficientAudio { .. } | Self::InvalidSampleRate(_) => {
                FailureReason::InsufficientAudio
            }
            Self::DimensionMismatch { .. } => FailureReason::DimensionMismatch,
            Self::ModelUnavailable
            | Self::InvalidParameters(_)
            | Self::Json(_)
            | Self::Io(_) => FailureReason::ModelUnavailable,
        }
    }
}
