use crate::ensemble::{Consensus, EnsemblePrediction};
use serde::Serialize;
use serde_json::Value;

pub const SERVICE_NAME: &str = "crop-recommendation";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub predictions: EnsemblePrediction,
    pub consensus: Option<Consensus>,
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub status: &'static str,
    pub predictions: EnsemblePrediction,
    pub consensus: Option<Consensus>,
    pub sample_data: Value,
    pub expected: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
