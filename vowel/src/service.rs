use std::fmt;
use std::path::Path;

use crate::classifier::{self, Prediction, VowelClassifier};
use crate::features::{FeatureExtractor, FeatureVectorBuilder};
use crate::result::ClassificationResult;
use crate::scaler::FeatureScaler;
use crate::VowelError;

/// Whether a [`ClassificationService`] can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No valid parameters were loaded; every prediction fails.
    Untrained,
    /// Scaler and classifier parameters are loaded.
    Ready,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untrained => write!(f, "untrained"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

struct Model {
    scaler: FeatureScaler,
    classifier: Box<dyn VowelClassifier>,
}

/// Runs feature extraction, scaling and classification for one buffer
/// at a time.
///
/// The service is constructed once, in either the untrained or the ready
/// state, and never changes afterwards. It holds no interior mutability,
/// so a single instance can be shared across threads (e.g. in an `Arc`)
/// and called concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use vocal_vowel::ClassificationService;
///
/// let service = ClassificationService::load_files("vocal_scaler.json", "vocal_model.json")
///     .unwrap_or_else(|_| ClassificationService::untrained());
///
/// let samples = vec![0.0f32; 16000];
/// match service.predict(&samples, 16000) {
///     Ok(p) => println!("{} ({:.2})", p.label, p.confidence),
///     Err(e) => println!("no classification: {e}"),
/// }
/// ```
pub struct ClassificationService {
    extractor: Box<dyn FeatureExtractor>,
    model: Option<Model>,
}

impl ClassificationService {
    /// Creates a service with no trained parameters.
    pub fn untrained() -> Self {
        Self {
            extractor: Box::new(FeatureVectorBuilder::new()),
            model: None,
        }
    }

    /// Creates a ready service from already-validated components.
    pub fn ready(scaler: FeatureScaler, classifier: Box<dyn VowelClassifier>) -> Self {
        Self {
            extractor: Box::new(FeatureVectorBuilder::new()),
            model: Some(Model { scaler, classifier }),
        }
    }

    /// Parses and validates both parameter blobs.
    ///
    /// Either both load and the service is ready, or an error is returned
    /// and the caller keeps an untrained service.
    pub fn load_parameters(scaler_src: &[u8], classifier_src: &[u8]) -> Result<Self, VowelError> {
        let scaler = FeatureScaler::from_json(scaler_src)?;
        let classifier = classifier::from_json(classifier_src)?;
        Ok(Self::ready(scaler, classifier))
    }

    /// Reads both parameter files and calls [`ClassificationService::load_parameters`].
    pub fn load_files(
        scaler_path: impl AsRef<Path>,
        classifier_path: impl AsRef<Path>,
    ) -> Result<Self, VowelError> {
        let scaler_src = std::fs::read(scaler_path)?;
        let classifier_src = std::fs::read(classifier_path)?;
        Self::load_parameters(&scaler_src, &classifier_src)
    }

    /// Replaces the feature extractor.
    pub fn with_extractor(mut self, extractor: impl FeatureExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn state(&self) -> ServiceState {
        if self.model.is_some() {
            ServiceState::Ready
        } else {
            ServiceState::Untrained
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Returns the classifier's label set, or an empty slice when untrained.
    pub fn labels(&self) -> &[String] {
        match &self.model {
            Some(m) => m.classifier.labels(),
            None => &[],
        }
    }

    /// Classifies one buffer of mono samples in [-1, 1].
    ///
    /// An untrained service fails with [`VowelError::ModelUnavailable`]
    /// without touching the samples.
    pub fn predict(&self, samples: &[f32], sample_rate: u32) -> Result<Prediction, VowelError> {
        let model = self.model.as_ref().ok_or(VowelError::ModelUnavailable)?;
        let features = self.extractor.extract(samples, sample_rate)?;
        let normalized = model.scaler.transform(features.as_slice())?;
        model.classifier.predict(&normalized)
    }

    /// Like [`ClassificationService::predict`], folded into a
    /// [`ClassificationResult`].
    pub fn predict_result(&self, samples: &[f32], sample_rate: u32) -> ClassificationResult {
        self.predict(samples, sample_rate).into()
    }
}

impl Default for ClassificationService {
    fn default() -> Self {
        Self::untrained()
    }
}

impl fmt::Debug for ClassificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationService")
            .field("state", &self.state())
            .field("labels", &self.labels())
            .finish()
    }
}
