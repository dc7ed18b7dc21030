use serde::{Deserialize, Serialize};

use super::{argmax, check_finite, Prediction, VowelClassifier};
use crate::VowelError;

/// Weights of a multinomial linear discriminant.
///
/// `weights` is `[num_classes][dim]`, `intercepts` is `[num_classes]`,
/// both in label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParameters {
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

/// Scores each class as `w_c . x + b_c` and converts the scores to
/// posteriors with a softmax.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    labels: Vec<String>,
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    dim: usize,
}

impl LinearClassifier {
    pub fn new(labels: Vec<String>, params: LinearParameters) -> Result<Self, VowelError> {
        let k = labels.len();
        if params.weights.len() != k || params.intercepts.len() != k {
            return Err(VowelError::InvalidParameters(format!(
                "linear model has {} weight rows and {} intercepts for {k} labels",
                params.weights.len(),
                params.intercepts.len()
            )));
        }
        let dim = params.weights.first().map_or(0, Vec::len);
        if dim == 0 {
            return Err(VowelError::InvalidParameters("empty weight rows".into()));
        }
        for (c, row) in params.weights.iter().enumerate() {
            if row.len() != dim {
                return Err(VowelError::InvalidParameters(format!(
                    "weight row {c} has {} entries, expected {dim}",
                    row.len()
                )));
            }
            check_finite(&format!("weights[{c}]"), row)?;
        }
        check_finite("intercepts", &params.intercepts)?;

        Ok(Self {
            labels,
            weights: params.weights,
            intercepts: params.intercepts,
            dim,
        })
    }

    /// Returns the softmax posterior for every class, in label order.
    pub fn posteriors(&self, features: &[f64]) -> Result<Vec<f64>, VowelError> {
        if features.len() != self.dim {
            return Err(VowelError::DimensionMismatch {
                expected: self.dim,
                got: features.len(),
            });
        }

        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        // Shift by the maximum score for numerical stability.
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        Ok(exp.into_iter().map(|e| e / sum).collect())
    }
}

impl VowelClassifier for LinearClassifier {
    fn predict(&self, features: &[f64]) -> Result<Prediction, VowelError> {
        let probs = self.posteriors(features)?;
        let best = argmax(&probs);
        Ok(Prediction {
            label: self.labels[best].clone(),
            confidence: probs[best],
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
