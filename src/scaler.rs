//! Fitted feature scalers.

use crate::features::{ScaledVector, FEATURE_COUNT};
use serde::Deserialize;

/// A fitted, stateless feature transform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scaler {
    /// Standardization: `(x - mean) / scale`.
    Standard {
        mean: Vec<f64>,
        scale: Vec<f64>,
        #[serde(default = "default_true")]
        with_mean: bool,
        #[serde(default = "default_true")]
        with_std: bool,
    },
    /// Min-max scaling as fitted: `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// Passthrough, for models trained on raw features.
    Identity,
}

fn default_true() -> bool {
    true
}

impl Scaler {
    /// Check the fitted parameters match the feature vector.
    pub fn validate(&self) -> Result<(), String> {
        let params: Vec<(&str, &[f64])> = match self {
            Scaler::Standard { mean, scale, .. } => vec![("mean", mean.as_slice()), ("scale", scale.as_slice())],
            Scaler::MinMax { min, scale } => vec![("min", min.as_slice()), ("scale", scale.as_slice())],
            Scaler::Identity => Vec::new(),
        };
        for (name, values) in params {
            if values.len() != FEATURE_COUNT {
                return Err(format!(
                    "{} has {} entries, expected {}",
                    name,
                    values.len(),
                    FEATURE_COUNT
                ));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("{} contains non-finite values", name));
            }
        }
        Ok(())
    }

    pub fn transform(&self, x: &[f64; FEATURE_COUNT]) -> ScaledVector {
        let mut out = *x;
        match self {
            Scaler::Standard {
                mean,
                scale,
                with_mean,
                with_std,
            } => {
                for (j, v) in out.iter_mut().enumerate() {
                    if *with_mean {
                        *v -= mean[j];
                    }
                    // zero variance features are left unscaled
                    if *with_std && scale[j] != 0.0 {
                        *v /= scale[j];
                    }
                }
            }
            Scaler::MinMax { min, scale } => {
                for (j, v) in out.iter_mut().enumerate() {
                    *v = *v * scale[j] + min[j];
                }
            }
            Scaler::Identity => {}
        }
        ScaledVector::new(out)
    }
}
