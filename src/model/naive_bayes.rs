use super::{check_finite, softmax, Classifier};
use crate::error::ClassifierError;
use crate::features::ScaledVector;
use serde::Deserialize;
use std::f64::consts::PI;

/// Gaussian naive Bayes with per-class feature means and variances.
#[derive(Debug, Clone, Deserialize)]
pub struct GaussianNb {
    theta: Vec<Vec<f64>>,
    var: Vec<Vec<f64>>,
    class_prior: Vec<f64>,
}

impl GaussianNb {
    pub fn new(theta: Vec<Vec<f64>>, var: Vec<Vec<f64>>, class_prior: Vec<f64>) -> Self {
        Self {
            theta,
            var,
            class_prior,
        }
    }

    fn joint_log_likelihood(&self, x: &[f64]) -> Vec<f64> {
        self.theta
            .iter()
            .zip(&self.var)
            .zip(&self.class_prior)
            .map(|((mean, var), prior)| {
                let log_norm: f64 = var.iter().map(|v| (2.0 * PI * v).ln()).sum();
                let sq: f64 = x
                    .iter()
                    .zip(mean)
                    .zip(var)
                    .map(|((xi, m), v)| (xi - m).powi(2) / v)
                    .sum();
                prior.ln() - 0.5 * log_norm - 0.5 * sq
            })
            .collect()
    }
}

impl Classifier for GaussianNb {
    fn family(&self) -> &'static str {
        "gaussian_nb"
    }

    fn n_classes(&self) -> usize {
        self.class_prior.len()
    }

    fn n_features(&self) -> Option<usize> {
        self.theta.first().map(Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        let n = self.class_prior.len();
        if n == 0 {
            return Err("class_prior is empty".to_string());
        }
        if self.theta.len() != n || self.var.len() != n {
            return Err(format!(
                "theta/var have {}/{} rows for {} classes",
                self.theta.len(),
                self.var.len(),
                n
            ));
        }
        let width = self.theta[0].len();
        for (mean, var) in self.theta.iter().zip(&self.var) {
            if mean.len() != width || var.len() != width {
                return Err("theta/var rows have different lengths".to_string());
            }
            check_finite("theta", mean)?;
            if var.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err("var must be finite and positive".to_string());
            }
        }
        check_finite("class_prior", &self.class_prior)?;
        if self.class_prior.iter().any(|p| *p < 0.0) || !self.class_prior.iter().any(|p| *p > 0.0)
        {
            return Err("class_prior must be non-negative with a positive entry".to_string());
        }
        Ok(())
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        Ok(softmax(&self.joint_log_likelihood(x.as_slice())))
    }
}
