use serde::{Deserialize, Serialize};

use super::{argmax, check_finite, Prediction, VowelClassifier};
use crate::VowelError;

/// Pairwise probabilities are kept away from 0 and 1 before coupling.
const MIN_PAIRWISE_PROB: f64 = 1e-7;

/// SVM kernel function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// `x . y`
    Linear,
    /// `(gamma x . y + coef0)^degree`
    Poly,
    /// `exp(-gamma |x - y|^2)`
    #[default]
    Rbf,
    /// `tanh(gamma x . y + coef0)`
    Sigmoid,
}

fn default_degree() -> u32 {
    3
}

/// One-vs-one SVM parameters in libsvm layout.
///
/// With `k` classes and `n` support vectors:
///
/// - `support_vectors`: `[n][dim]`, grouped by class in label order
/// - `n_support`: `[k]`, number of support vectors per class
/// - `dual_coef`: `[k - 1][n]`
/// - `rho`, `prob_a`, `prob_b`: `[k (k - 1) / 2]`, one per class pair
///   `(i, j)` with `i < j`, ordered by `i` then `j`
///
/// The pairwise decision value is `sum(coef * K(sv, x)) - rho`; positive
/// values vote for the first class of the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParameters {
    #[serde(default)]
    pub kernel: Kernel,
    pub gamma: f64,
    #[serde(default)]
    pub coef0: f64,
    #[serde(default = "default_degree")]
    pub degree: u32,
    pub support_vectors: Vec<Vec<f64>>,
    pub n_support: Vec<usize>,
    pub dual_coef: Vec<Vec<f64>>,
    pub rho: Vec<f64>,
    pub prob_a: Vec<f64>,
    pub prob_b: Vec<f64>,
}

/// One-vs-one kernel SVM with Platt-scaled posteriors.
///
/// The label is the one-vs-one vote winner. The confidence is the largest
/// posterior after coupling the pairwise Platt probabilities (Wu, Lin and
/// Weng, 2004). The two can disagree on borderline inputs; the vote is
/// authoritative for the label.
#[derive(Debug, Clone)]
pub struct SvmClassifier {
    labels: Vec<String>,
    params: SvmParameters,
    /// Index of each class's first support vector.
    starts: Vec<usize>,
    dim: usize,
}

impl SvmClassifier {
    pub fn new(labels: Vec<String>, params: SvmParameters) -> Result<Self, VowelError> {
        let k = labels.len();
        if k < 2 {
            return Err(invalid(format!("need at least 2 labels, got {k}")));
        }
        let pairs = k * (k - 1) / 2;
        let n_sv = params.support_vectors.len();

        if params.n_support.len() != k {
            return Err(invalid(format!(
                "n_support has {} entries for {k} labels",
                params.n_support.len()
            )));
        }
        if params.n_support.iter().sum::<usize>() != n_sv || n_sv == 0 {
            return Err(invalid(format!(
                "n_support sums to {}, but there are {n_sv} support vectors",
                params.n_support.iter().sum::<usize>()
            )));
        }
        let dim = params.support_vectors[0].len();
        if dim == 0 {
            return Err(invalid("empty support vectors".into()));
        }
        for (i, sv) in params.support_vectors.iter().enumerate() {
            if sv.len() != dim {
                return Err(invalid(format!(
                    "support vector {i} has {} entries, expected {dim}",
                    sv.len()
                )));
            }
            check_finite(&format!("support_vectors[{i}]"), sv)?;
        }
        if params.dual_coef.len() != k - 1 {
            return Err(invalid(format!(
                "dual_coef has {} rows, expected {}",
                params.dual_coef.len(),
                k - 1
            )));
        }
        for (i, row) in params.dual_coef.iter().enumerate() {
            if row.len() != n_sv {
                return Err(invalid(format!(
                    "dual_coef row {i} has {} entries, expected {n_sv}",
                    row.len()
                )));
            }
            check_finite(&format!("dual_coef[{i}]"), row)?;
        }
        for (name, v) in [
            ("rho", &params.rho),
            ("prob_a", &params.prob_a),
            ("prob_b", &params.prob_b),
        ] {
            if v.len() != pairs {
                return Err(invalid(format!(
                    "{name} has {} entries, expected {pairs}",
                    v.len()
                )));
            }
            check_finite(name, v)?;
        }
        check_finite("kernel parameters", &[params.gamma, params.coef0])?;

        let starts = params
            .n_support
            .iter()
            .scan(0, |acc, &n| {
                let start = *acc;
                *acc += n;
                Some(start)
            })
            .collect();

        Ok(Self {
            labels,
            params,
            starts,
            dim,
        })
    }

    fn kernel(&self, sv: &[f64], x: &[f64]) -> f64 {
        let p = &self.params;
        let dot = || sv.iter().zip(x).map(|(a, b)| a * b).sum::<f64>();
        match p.kernel {
            Kernel::Linear => dot(),
            Kernel::Poly => (p.gamma * dot() + p.coef0).powi(p.degree as i32),
            Kernel::Rbf => {
                let dist: f64 = sv.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum();
                (-p.gamma * dist).exp()
            }
            Kernel::Sigmoid => (p.gamma * dot() + p.coef0).tanh(),
        }
    }

    /// Returns the pairwise decision values, ordered `(0,1), (0,2), .., (k-2,k-1)`.
    pub fn decision_values(&self, features: &[f64]) -> Result<Vec<f64>, VowelError> {
        if features.len() != self.dim {
            return Err(VowelError::DimensionMismatch {
                expected: self.dim,
                got: features.len(),
            });
        }

        let p = &self.params;
        let kvalues: Vec<f64> = p
            .support_vectors
            .iter()
            .map(|sv| self.kernel(sv, features))
            .collect();

        let k = self.labels.len();
        let mut dec = Vec::with_capacity(k * (k - 1) / 2);
        for i in 0..k {
            for j in i + 1..k {
                let (si, sj) = (self.starts[i], self.starts[j]);
                let (ci, cj) = (p.n_support[i], p.n_support[j]);
                let coef1 = &p.dual_coef[j - 1];
                let coef2 = &p.dual_coef[i];

                let mut sum = 0.0;
                for s in si..si + ci {
                    sum += coef1[s] * kvalues[s];
                }
                for s in sj..sj + cj {
                    sum += coef2[s] * kvalues[s];
                }
                dec.push(sum - p.rho[dec.len()]);
            }
        }
        Ok(dec)
    }

    /// Returns the coupled posterior for every class, in label order.
    pub fn posteriors(&self, features: &[f64]) -> Result<Vec<f64>, VowelError> {
        let dec = self.decision_values(features)?;
        Ok(self.couple(&dec))
    }

    fn couple(&self, dec: &[f64]) -> Vec<f64> {
        let k = self.labels.len();
        let mut r = vec![vec![0.0f64; k]; k];
        let mut p = 0;
        for i in 0..k {
            for j in i + 1..k {
                let prob = platt(dec[p], self.params.prob_a[p], self.params.prob_b[p])
                    .clamp(MIN_PAIRWISE_PROB, 1.0 - MIN_PAIRWISE_PROB);
                r[i][j] = prob;
                r[j][i] = 1.0 - prob;
                p += 1;
            }
        }
        multiclass_probability(&r)
    }

    fn votes(&self, dec: &[f64]) -> Vec<f64> {
        let k = self.labels.len();
        let mut votes = vec![0.0f64; k];
        let mut p = 0;
        for i in 0..k {
            for j in i + 1..k {
                if dec[p] > 0.0 {
                    votes[i] += 1.0;
                } else {
                    votes[j] += 1.0;
                }
                p += 1;
            }
        }
        votes
    }
}

impl VowelClassifier for SvmClassifier {
    fn predict(&self, features: &[f64]) -> Result<Prediction, VowelError> {
        let dec = self.decision_values(features)?;
        let best = argmax(&self.votes(&dec));
        let probs = self.couple(&dec);
        let confidence = probs.iter().copied().fold(0.0f64, f64::max);
        Ok(Prediction {
            label: self.labels[best].clone(),
            confidence,
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

fn invalid(msg: String) -> VowelError {
    VowelError::InvalidParameters(msg)
}

/// Platt sigmoid `1 / (1 + exp(a * dec + b))`, evaluated without overflow.
fn platt(dec: f64, a: f64, b: f64) -> f64 {
    let f = dec * a + b;
    if f >= 0.0 {
        (-f).exp() / (1.0 + (-f).exp())
    } else {
        1.0 / (1.0 + f.exp())
    }
}

/// Couples pairwise probabilities `r[i][j] = P(i | i or j)` into class
/// posteriors by iteratively minimizing `p' Q p` subject to `sum(p) = 1`.
fn multiclass_probability(r: &[Vec<f64>]) -> Vec<f64> {
    let k = r.len();
    let max_iter = k.max(100);
    let eps = 0.005 / k as f64;

    let mut q = vec![vec![0.0f64; k]; k];
    for t in 0..k {
        for j in 0..t {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = q[j][t];
        }
        for j in t + 1..k {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = -r[j][t] * r[t][j];
        }
    }

    let mut p = vec![1.0 / k as f64; k];
    let mut qp = vec![0.0f64; k];
    for _ in 0..max_iter {
        let mut pqp = 0.0;
        for t in 0..k {
            qp[t] = (0..k).map(|j| q[t][j] * p[j]).sum();
            pqp += p[t] * qp[t];
        }
        let max_error = qp.iter().map(|v| (v - pqp).abs()).fold(0.0f64, f64::max);
        if max_error < eps {
            break;
        }
        for t in 0..k {
            let diff = (-qp[t] + pqp) / q[t][t];
            p[t] += diff;
            pqp = (pqp + diff * (diff * q[t][t] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
    }
    p
}
