#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use crop_predictor::error::ClassifierError;
use crop_predictor::model::Classifier;
use crop_predictor::{ArtifactPaths, ArtifactStore, ScaledVector, ServiceState};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Model names in the fixture ensemble, in file order.
pub const FIXTURE_MODELS: [&str; 5] = [
    "Logistic Regression",
    "Decision Tree",
    "Random Forest",
    "Naive Bayes",
    "KNN",
];

pub const FIXTURE_LABELS: [&str; 4] = ["apple", "banana", "cotton", "rice"];

pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/models")
}

pub fn load_fixture_state() -> ServiceState {
    ArtifactStore::new(ArtifactPaths::in_dir(fixture_dir()))
        .load()
        .expect("fixture artifacts should load")
}

/// Copy the fixture artifacts into a fresh temp directory for mutation.
pub fn copy_fixtures() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    for name in ["trained_models.json", "scaler.json", "label_encoder.json"] {
        fs::copy(fixture_dir().join(name), dir.path().join(name)).expect("Should copy fixture");
    }
    dir
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

pub fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn sample_body() -> Value {
    serde_json::json!({
        "N": 118, "P": 46, "K": 20,
        "temperature": 24, "humidity": 80,
        "ph": 6.9, "rainfall": 80
    })
}

/// A classifier whose probability call always fails.
pub struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn family(&self) -> &'static str {
        "broken"
    }

    fn n_classes(&self) -> usize {
        4
    }

    fn predict(&self, _x: &ScaledVector) -> Result<usize, ClassifierError> {
        Ok(2)
    }

    fn predict_proba(&self, _x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        Err(ClassifierError::Backend("probability head is missing".to_string()))
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, serde_json::to_string(body).unwrap())
}

pub fn post_raw(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
