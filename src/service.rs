//! The prediction facade every caller goes through.

use crate::artifacts::ServiceState;
use crate::ensemble::{self, EnsemblePrediction};
use crate::error::ServiceError;
use crate::features::{FeatureRanges, FeatureRecord, FeatureVectorizer, ScaledVector};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Built-in smoke test record: N, P, K, temperature, humidity, ph, rainfall.
pub const SAMPLE_RECORD: [f64; 7] = [118.0, 46.0, 20.0, 24.0, 80.0, 6.9, 80.0];

/// What the primary model is expected to say about [`SAMPLE_RECORD`].
/// Documented, never enforced.
pub const EXPECTED_SAMPLE_LABEL: &str = "cotton";

/// Stateless over a shared, read-only [`ServiceState`].
#[derive(Debug, Clone, Default)]
pub struct PredictionService {
    state: Option<Arc<ServiceState>>,
    ranges: Option<FeatureRanges>,
    log_vectors: bool,
}

impl PredictionService {
    pub fn new(state: ServiceState) -> Self {
        Self {
            state: Some(Arc::new(state)),
            ..Self::default()
        }
    }

    /// A service whose artifacts failed to load. Every prediction fails fast.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_ranges(mut self, ranges: Option<FeatureRanges>) -> Self {
        self.ranges = ranges;
        self
    }

    pub fn with_vector_logging(mut self, enabled: bool) -> Self {
        self.log_vectors = enabled;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    pub fn model_names(&self) -> Vec<String> {
        self.state
            .as_deref()
            .map(ServiceState::model_names)
            .unwrap_or_default()
    }

    pub fn sample_record() -> FeatureRecord {
        FeatureRecord::new(SAMPLE_RECORD)
    }

    /// Validate, vectorize and run the whole ensemble on a raw JSON body.
    pub fn predict(&self, raw: &Value) -> Result<EnsemblePrediction, ServiceError> {
        let state = self.state()?;
        let vector = self.vectorizer(state).vectorize(raw)?;
        self.run(state, &vector)
    }

    pub fn predict_record(&self, record: &FeatureRecord) -> Result<EnsemblePrediction, ServiceError> {
        let state = self.state()?;
        let vector = self.vectorizer(state).vectorize_record(record)?;
        self.run(state, &vector)
    }

    pub fn predict_sample(&self) -> Result<EnsemblePrediction, ServiceError> {
        self.predict_record(&Self::sample_record())
    }

    fn state(&self) -> Result<&ServiceState, ServiceError> {
        self.state.as_deref().ok_or(ServiceError::Unavailable)
    }

    fn vectorizer<'a>(&'a self, state: &'a ServiceState) -> FeatureVectorizer<'a> {
        FeatureVectorizer::new(state.scaler()).with_ranges(self.ranges.as_ref())
    }

    fn run(
        &self,
        state: &ServiceState,
        vector: &ScaledVector,
    ) -> Result<EnsemblePrediction, ServiceError> {
        if self.log_vectors {
            log_vector(vector);
        }
        Ok(ensemble::predict_all(vector, state)?)
    }
}

fn log_vector(vector: &ScaledVector) {
    let v = vector.as_slice();
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    let std = (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    let nonzero = v.iter().filter(|x| **x != 0.0).count();
    info!(
        dim = v.len(),
        nonzero,
        mean = %format!("{:.3}", mean),
        std = %format!("{:.3}", std),
        vector = ?v,
        "Scaled input vector"
    );
}
