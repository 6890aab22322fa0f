//! Error types for every layer of the prediction pipeline.

use crate::features::Feature;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the three fitted artifacts an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Models,
    Scaler,
    LabelEncoder,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Models => "models",
            ArtifactKind::Scaler => "scaler",
            ArtifactKind::LabelEncoder => "label encoder",
        })
    }
}

/// Failure to bring up the service state. Fatal to startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {kind} artifact at {}: {source}", .path.display())]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {kind} artifact at {}: {source}", .path.display())]
    Parse {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} artifact: {reason}")]
    Invalid { kind: ArtifactKind, reason: String },

    #[error("classifier '{name}' is invalid: {reason}")]
    InvalidClassifier { name: String, reason: String },

    #[error("ensemble contains no classifiers")]
    EmptyEnsemble,

    #[error("classifier '{name}' uses family '{family}', which this build does not support")]
    UnsupportedFamily { name: String, family: &'static str },

    #[cfg(feature = "torchscript")]
    #[error("failed to load TorchScript module for '{name}': {source}")]
    Torch {
        name: String,
        #[source]
        source: tch::TchError,
    },
}

/// Client input defects. Always recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing field: {field}")]
    MissingField { field: Feature },

    #[error("Invalid type for field: {field} (expected a finite number)")]
    InvalidType { field: Feature },

    #[error("{field} value {value} out of valid range [{min}, {max}]")]
    OutOfRange {
        field: Feature,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

/// Raised by a single classifier during `predict` or `predict_proba`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty probability distribution")]
    EmptyDistribution,

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("class index {index} is unknown to the label decoder ({known} classes)")]
    UnknownClass { index: usize, known: usize },

    #[error("{0}")]
    Backend(String),
}

/// One classifier of the ensemble failed; the whole prediction is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("classifier '{classifier}' failed: {cause}")]
pub struct InferenceError {
    pub classifier: String,
    #[source]
    pub cause: ClassifierError,
}

/// Everything the prediction facade can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Models not loaded")]
    Unavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}
