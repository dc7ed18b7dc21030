use serde::{Deserialize, Serialize};

use crate::{VowelError, PARAMETERS_VERSION};

/// Persisted per-dimension z-score parameters.
///
/// JSON format:
///
/// ```json
/// { "version": 1, "mean": [..], "scale": [..] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParameters {
    pub version: u32,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Applies a pre-fitted per-dimension standardization.
///
/// The scaler does not know the feature layout; a length that disagrees
/// with the incoming vector is reported on every call as
/// [`VowelError::DimensionMismatch`].
#[derive(Debug, Clone)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler {
    /// Creates a scaler from validated parameters.
    pub fn new(params: ScalerParameters) -> Result<Self, VowelError> {
        if params.version != PARAMETERS_VERSION {
            return Err(VowelError::InvalidParameters(format!(
                "unsupported scaler version {}",
                params.version
            )));
        }
        if params.mean.len() != params.scale.len() {
            return Err(VowelError::InvalidParameters(format!(
                "scaler mean has {} entries, scale has {}",
                params.mean.len(),
                params.scale.len()
            )));
        }
        if params.mean.is_empty() {
            return Err(VowelError::InvalidParameters("empty scaler".into()));
        }
        if let Some(i) = params.mean.iter().position(|m| !m.is_finite()) {
            return Err(VowelError::InvalidParameters(format!(
                "scaler mean[{i}] is not finite"
            )));
        }
        if let Some(i) = params.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(VowelError::InvalidParameters(format!(
                "scaler scale[{i}] must be finite and non-zero"
            )));
        }
        Ok(Self {
            mean: params.mean,
            scale: params.scale,
        })
    }

    /// Creates a scaler from a JSON-encoded [`ScalerParameters`] blob.
    pub fn from_json(data: &[u8]) -> Result<Self, VowelError> {
        let params: ScalerParameters = serde_json::from_slice(data)?;
        Self::new(params)
    }

    /// Identity scaler (mean 0, scale 1) of the given dimension.
    pub fn identity(dim: usize) -> Self {
        Self {
            mean: vec![0.0; dim],
            scale: vec![1.0; dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Computes `(v[i] - mean[i]) / scale[i]` for each dimension.
    pub fn transform(&self, v: &[f64]) -> Result<Vec<f64>, VowelError> {
        self.check_dimension(v.len())?;
        Ok(v
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Computes `n[i] * scale[i] + mean[i]`, undoing [`FeatureScaler::transform`].
    pub fn inverse_transform(&self, n: &[f64]) -> Result<Vec<f64>, VowelError> {
        self.check_dimension(n.len())?;
        Ok(n
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| x * s + m)
            .collect())
    }

    fn check_dimension(&self, got: usize) -> Result<(), VowelError> {
        if got != self.mean.len() {
            return Err(VowelError::DimensionMismatch {
                expected: self.mean.len(),
                got,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(mean: Vec<f64>, scale: Vec<f64>) -> ScalerParameters {
        ScalerParameters {
            version: PARAMETERS_VERSION,
            mean,
            scale,
        }
    }

    #[test]
    fn transform_standardizes() {
        let s = FeatureScaler::new(params(vec![1.0, -2.0], vec![2.0, 0.5])).unwrap();
        let out = s.transform(&[3.0, -1.0]).unwrap();
        assert_eq!(out, vec![1.0, 2.0]);
    }

    #[test]
    fn inverse_recovers_input() {
        let mean: Vec<f64> = (0..56).map(|i| i as f64 * 13.7 - 200.0).collect();
        let scale: Vec<f64> = (0..56).map(|i| 0.01 + i as f64 * 3.3).collect();
        let s = FeatureScaler::new(params(mean, scale)).unwrap();
        let v: Vec<f64> = (0..56).map(|i| (i as f64 * 0.37).sin() * 1000.0).collect();
        let back = s.inverse_transform(&s.transform(&v).unwrap()).unwrap();
        for (a, b) in v.iter().zip(&back) {
            assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0), "{a} vs {b}");
        }
    }

    #[test]
    fn transform_is_affine() {
        let s = FeatureScaler::new(params(vec![5.0, 1.0, -3.0], vec![2.0, 4.0, 0.25])).unwrap();
        let a = [1.0, 2.0, 3.0];
        let b = [-4.0, 0.5, 8.0];
        let mid: Vec<f64> = a.iter().zip(&b).map(|(x, y)| (x + y) / 2.0).collect();
        let ta = s.transform(&a).unwrap();
        let tb = s.transform(&b).unwrap();
        let tmid = s.transform(&mid).unwrap();
        for i in 0..3 {
            assert!((tmid[i] - (ta[i] + tb[i]) / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn dimension_mismatch() {
        let s = FeatureScaler::identity(10);
        match s.transform(&[0.0; 56]) {
            Err(VowelError::DimensionMismatch { expected, got }) => {
                assert_eq!(expected, 10);
                assert_eq!(got, 56);
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
        assert!(s.inverse_transform(&[0.0; 3]).is_err());
    }

    #[test]
    fn identity_is_noop() {
        let s = FeatureScaler::identity(4);
        assert_eq!(s.transform(&[1.0, -2.0, 3.5, 0.0]).unwrap(), vec![1.0, -2.0, 3.5, 0.0]);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(FeatureScaler::new(params(vec![0.0; 3], vec![1.0; 2])).is_err());
        assert!(FeatureScaler::new(params(vec![], vec![])).is_err());
        assert!(FeatureScaler::new(params(vec![0.0, 0.0], vec![1.0, 0.0])).is_err());
        assert!(FeatureScaler::new(params(vec![f64::NAN], vec![1.0])).is_err());
        let mut p = params(vec![0.0], vec![1.0]);
        p.version = 2;
        assert!(matches!(
            FeatureScaler::new(p),
            Err(VowelError::InvalidParameters(_))
        ));
    }

    #[test]
    fn short_scaler_loads() {
        // A length that disagrees with the feature layout is only caught
        // at transform time.
        let json = format!(
            r#"{{"version":1,"mean":{:?},"scale":{:?}}}"#,
            vec![0.0; 10],
            vec![1.0; 10]
        );
        let s = FeatureScaler::from_json(json.as_bytes()).unwrap();
        assert_eq!(s.dimension(), 10);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            FeatureScaler::from_json(b"not json"),
            Err(VowelError::Json(_))
        ));
        assert!(matches!(
            FeatureScaler::from_json(br#"{"version":1,"mean":[1.0]}"#),
            Err(VowelError::Json(_))
        ));
    }
}
