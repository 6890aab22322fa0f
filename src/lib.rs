//! Crop recommendation service.
//!
//! Loads a fitted ensemble of classifiers with its feature scaler and label
//! decoder, and answers soil/climate readings with one crop prediction and
//! confidence per classifier.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod labels;
pub mod model;
pub mod scaler;
pub mod service;
pub mod types;

pub use api::{build_router, AppState};
pub use artifacts::{ArtifactPaths, ArtifactStore, ServiceState};
pub use config::ServiceConfig;
pub use ensemble::{predict_all, Consensus, EnsemblePrediction, ModelPrediction};
pub use error::{ClassifierError, InferenceError, LoadError, ServiceError, ValidationError};
pub use features::{Feature, FeatureRecord, FeatureVectorizer, ScaledVector};
pub use service::PredictionService;
