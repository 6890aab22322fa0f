use super::{check_finite, dot, normalize, sigmoid, softmax, Classifier};
use crate::error::ClassifierError;
use crate::features::ScaledVector;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    #[default]
    Multinomial,
    Ovr,
}

/// Linear model with a logistic link.
///
/// A single coefficient row means a binary model whose score is the log-odds
/// of the second class.
#[derive(Debug, Clone, Deserialize)]
pub struct LogisticRegression {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    #[serde(default)]
    multi_class: MultiClass,
}

impl LogisticRegression {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Self {
        Self {
            coef,
            intercept,
            multi_class: MultiClass::Multinomial,
        }
    }

    pub fn with_multi_class(mut self, multi_class: MultiClass) -> Self {
        self.multi_class = multi_class;
        self
    }

    fn decision_function(&self, x: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| dot(w, x) + b)
            .collect()
    }
}

impl Classifier for LogisticRegression {
    fn family(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_classes(&self) -> usize {
        match self.coef.len() {
            1 => 2,
            n => n,
        }
    }

    fn n_features(&self) -> Option<usize> {
        self.coef.first().map(Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        let width = self.n_features().ok_or("coef is empty")?;
        if self.coef.iter().any(|row| row.len() != width) {
            return Err("coef rows have different lengths".to_string());
        }
        if self.intercept.len() != self.coef.len() {
            return Err(format!(
                "intercept has {} entries for {} coef rows",
                self.intercept.len(),
                self.coef.len()
            ));
        }
        for row in &self.coef {
            check_finite("coef", row)?;
        }
        check_finite("intercept", &self.intercept)
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        let scores = self.decision_function(x.as_slice());
        if let [z] = scores[..] {
            let p = sigmoid(z);
            return Ok(vec![1.0 - p, p]);
        }
        match self.multi_class {
            MultiClass::Multinomial => Ok(softmax(&scores)),
            MultiClass::Ovr => {
                let odds: Vec<f64> = scores.into_iter().map(sigmoid).collect();
                normalize(&odds)
            }
        }
    }
}
