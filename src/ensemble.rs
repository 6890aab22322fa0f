//! Runs every classifier of the ensemble against one scaled vector.

use crate::artifacts::ServiceState;
use crate::error::{ClassifierError, InferenceError};
use crate::features::ScaledVector;
use crate::model::NamedClassifier;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

/// Probability mass tolerated outside [0, 1] from floating point error.
const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// One classifier's answer.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModelPrediction {
    pub label: String,
    pub confidence: f64,
}

/// Per-classifier predictions, in ensemble order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnsemblePrediction {
    entries: Vec<(String, ModelPrediction)>,
}

impl EnsemblePrediction {
    pub fn get(&self, name: &str) -> Option<&ModelPrediction> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelPrediction)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, name: &str, prediction: ModelPrediction) {
        self.entries.push((name.to_string(), prediction));
    }
}

impl Serialize for EnsemblePrediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, prediction) in &self.entries {
            map.serialize_entry(name, prediction)?;
        }
        map.end()
    }
}

/// The label with the highest mean confidence across the classifiers
/// voting for it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Consensus {
    pub label: String,
    pub confidence: f64,
}

impl Consensus {
    /// `None` when no label has a positive mean confidence. Ties keep the
    /// label seen first.
    pub fn from_predictions(predictions: &EnsemblePrediction) -> Option<Self> {
        let mut scores: Vec<(&str, f64, usize)> = Vec::new();
        for (_, p) in predictions.iter() {
            match scores.iter_mut().find(|(label, _, _)| *label == p.label) {
                Some((_, total, count)) => {
                    *total += p.confidence;
                    *count += 1;
                }
                None => scores.push((p.label.as_str(), p.confidence, 1)),
            }
        }

        let mut best: Option<Consensus> = None;
        for (label, total, count) in scores {
            let mean = total / count as f64;
            if mean > best.as_ref().map_or(0.0, |b| b.confidence) {
                best = Some(Consensus {
                    label: label.to_string(),
                    confidence: mean,
                });
            }
        }
        best
    }
}

/// Query every classifier. One failing classifier fails the whole call.
pub fn predict_all(
    vector: &ScaledVector,
    state: &ServiceState,
) -> Result<EnsemblePrediction, InferenceError> {
    let mut predictions = EnsemblePrediction::default();
    for clf in state.classifiers() {
        let prediction = predict_one(clf, vector, state).map_err(|cause| InferenceError {
            classifier: clf.name().to_string(),
            cause,
        })?;
        debug!(
            model = %clf.name(),
            label = %prediction.label,
            confidence = prediction.confidence,
            "Classifier prediction"
        );
        predictions.push(clf.name(), prediction);
    }
    Ok(predictions)
}

fn predict_one(
    clf: &NamedClassifier,
    vector: &ScaledVector,
    state: &ServiceState,
) -> Result<ModelPrediction, ClassifierError> {
    let class_index = clf.predict(vector)?;
    let confidence = confidence(&clf.predict_proba(vector)?)?;
    let decoder = state.decoder();
    let label = decoder
        .decode(class_index)
        .ok_or(ClassifierError::UnknownClass {
            index: class_index,
            known: decoder.len(),
        })?;

    Ok(ModelPrediction {
        label: label.to_string(),
        confidence,
    })
}

/// Maximum of the distribution, checked to be a probability.
fn confidence(distribution: &[f64]) -> Result<f64, ClassifierError> {
    let max = distribution
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(ClassifierError::EmptyDistribution)?;
    if !max.is_finite() || max < -PROBABILITY_TOLERANCE || max > 1.0 + PROBABILITY_TOLERANCE {
        return Err(ClassifierError::InvalidProbability(max));
    }
    Ok(max.clamp(0.0, 1.0))
}
