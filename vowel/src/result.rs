use std::fmt;

use serde::Serialize;

use crate::classifier::Prediction;
use crate::VowelError;

/// Why a classification produced no label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The buffer is shorter than the minimum analysis window.
    InsufficientAudio,
    /// The service holds no trained parameters.
    ModelUnavailable,
    /// The feature vector and the loaded parameters disagree on length.
    DimensionMismatch,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientAudio => write!(f, "insufficient_audio"),
            Self::ModelUnavailable => write!(f, "model_unavailable"),
            Self::DimensionMismatch => write!(f, "dimension_mismatch"),
        }
    }
}

/// Outcome of one classification request.
///
/// Exactly one of `label` and `error` is set. A failed classification
/// always carries a confidence of 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: Option<String>,
    pub confidence: f64,
    pub error: Option<FailureReason>,
}

impl ClassificationResult {
    /// Returns true if the classification produced a label.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl From<Prediction> for ClassificationResult {
    fn from(p: Prediction) -> Self {
        Self {
            label: Some(p.label),
            confidence: p.confidence,
            error: None,
        }
    }
}

impl From<Result<Prediction, VowelError>> for ClassificationResult {
    fn from(r: Result<Prediction, VowelError>) -> Self {
        match r {
            Ok(p) => p.into(),
            Err(e) => Self {
                label: None,
                confidence: 0.0,
                error: Some(e.reason()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_display() {
        assert_eq!(FailureReason::InsufficientAudio.to_string(), "insufficient_audio");
        assert_eq!(FailureReason::ModelUnavailable.to_string(), "model_unavailable");
        assert_eq!(FailureReason::DimensionMismatch.to_string(), "dimension_mismatch");
    }

    #[test]
    fn result_from_prediction() {
        let r = ClassificationResult::from(Ok(Prediction {
            label: "a".into(),
            confidence: 0.75,
        }));
        assert!(r.is_ok());
        assert_eq!(r.label.as_deref(), Some("a"));
        assert_eq!(r.confidence, 0.75);
    }

    #[test]
    fn result_from_error() {
        let r = ClassificationResult::from(Err(VowelError::DimensionMismatch {
            expected: 56,
            got: 10,
        }));
        assert!(!r.is_ok());
        assert_eq!(r.label, None);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.error, Some(FailureReason::DimensionMismatch));
    }

    #[test]
    fn load_errors_report_model_unavailable() {
        let e = VowelError::InvalidParameters("bad".into());
        assert_eq!(e.reason(), FailureReason::ModelUnavailable);
    }

    #[test]
    fn result_serializes_snake_case() {
        let r = ClassificationResult::from(Err(VowelError::ModelUnavailable));
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"label":null,"confidence":0.0,"error":"model_unavailable"}"#
        );
    }
}
