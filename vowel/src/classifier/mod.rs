//! Pre-trained multi-class vowel classifiers.
//!
//! Parameters are loaded from a narrow, versioned JSON schema holding
//! only numeric arrays and a label list. The `model.kind` field selects
//! the decision procedure:
//!
//! - `linear`: multinomial linear discriminant with softmax posteriors
//! - `svm`: one-vs-one kernel SVM with Platt-scaled, pairwise-coupled
//!   posteriors
//!
//! ```json
//! {
//!   "version": 1,
//!   "labels": ["a", "e", "i", "o", "u"],
//!   "model": { "kind": "linear", "weights": [[..], ..], "intercepts": [..] }
//! }
//! ```

mod linear;
mod svm;

use serde::{Deserialize, Serialize};

use crate::{VowelError, PARAMETERS_VERSION};

pub use linear::{LinearClassifier, LinearParameters};
pub use svm::{Kernel, SvmClassifier, SvmParameters};

/// A classification decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// One of the classifier's labels.
    pub label: String,
    /// Maximum posterior across classes, in [0, 1].
    pub confidence: f64,
}

/// Maps a normalized feature vector to a vowel label.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use and must not mutate
/// their parameters: identical input always yields an identical
/// prediction.
pub trait VowelClassifier: Send + Sync {
    /// Classifies a normalized feature vector.
    fn predict(&self, features: &[f64]) -> Result<Prediction, VowelError>;

    /// Returns the ordered label set.
    fn labels(&self) -> &[String];

    /// Returns the expected input dimension.
    fn dimension(&self) -> usize;
}

/// Persisted classifier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParameters {
    pub version: u32,
    pub labels: Vec<String>,
    pub model: ModelParameters,
}

/// Model-specific parameters, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelParameters {
    Linear(LinearParameters),
    Svm(SvmParameters),
}

impl ClassifierParameters {
    /// Parses a JSON-encoded parameter blob.
    pub fn from_json(data: &[u8]) -> Result<Self, VowelError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Validates the parameters and builds the classifier they describe.
    pub fn into_classifier(self) -> Result<Box<dyn VowelClassifier>, VowelError> {
        if self.version != PARAMETERS_VERSION {
            return Err(VowelError::InvalidParameters(format!(
                "unsupported classifier version {}",
                self.version
            )));
        }
        if self.labels.len() < 2 {
            return Err(VowelError::InvalidParameters(format!(
                "need at least 2 labels, got {}",
                self.labels.len()
            )));
        }
        match self.model {
            ModelParameters::Linear(p) => Ok(Box::new(LinearClassifier::new(self.labels, p)?)),
            ModelParameters::Svm(p) => Ok(Box::new(SvmClassifier::new(self.labels, p)?)),
        }
    }
}

/// Loads a classifier from a JSON-encoded [`ClassifierParameters`] blob.
pub fn from_json(data: &[u8]) -> Result<Box<dyn VowelClassifier>, VowelError> {
    ClassifierParameters::from_json(data)?.into_classifier()
}

/// Index of the largest value; ties resolve to the lowest index.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

pub(crate) fn check_finite(name: &str, values: &[f64]) -> Result<(), VowelError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(VowelError::InvalidParameters(format!(
            "{name}[{i}] is not finite"
        ))),
        None => Ok(()),
    }
}
