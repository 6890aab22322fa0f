//! Integration tests for the HTTP endpoints
//!
//! Run with: cargo test --test api_tests -- --nocapture

mod common;

use axum::http::StatusCode;
use common::*;
use crop_predictor::features::FeatureRanges;
use crop_predictor::labels::LabelDecoder;
use crop_predictor::model::{ClassifierArtifact, NamedClassifier};
use crop_predictor::scaler::Scaler;
use crop_predictor::{build_router, AppState, PredictionService, ServiceState};
use serde_json::{json, Value};
use std::path::Path;
use tower::util::ServiceExt; // for `oneshot`

fn ready_app() -> axum::Router {
    build_router(AppState::new(PredictionService::new(load_fixture_state())))
}

fn degraded_app() -> axum::Router {
    build_router(AppState::new(PredictionService::unavailable()))
}

/// Fixture scaler and decoder around the given classifiers.
fn state_with(classifiers: Vec<NamedClassifier>) -> ServiceState {
    let dir = fixture_dir();
    let scaler: Scaler = serde_json::from_value(read_json(&dir.join("scaler.json"))).unwrap();
    let decoder: LabelDecoder =
        serde_json::from_value(read_json(&dir.join("label_encoder.json"))).unwrap();
    ServiceState::new(classifiers, scaler, decoder).unwrap()
}

fn fixture_classifier(name: &str) -> NamedClassifier {
    let models = read_json(&fixture_dir().join("trained_models.json"));
    let artifact: ClassifierArtifact = serde_json::from_value(models[name].clone()).unwrap();
    artifact.build(name, Path::new(".")).unwrap()
}

// =============================================================================
// /health
// =============================================================================

#[tokio::test]
async fn test_health_when_ready() {
    let response = ready_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["service"], "crop-recommendation");
    assert!(body["version"].is_string());
    assert_eq!(body["models"], json!(FIXTURE_MODELS));
}

#[tokio::test]
async fn test_health_when_not_loaded() {
    println!("\n=== Test: Health Without Models ===");
    let response = degraded_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["error"], "Models not loaded");
    println!("✓ Degraded health reported");
}

// =============================================================================
// /predict
// =============================================================================

#[tokio::test]
async fn test_predict_sample_input() {
    println!("\n=== Test: Predict Cotton Sample ===");
    let response = ready_app()
        .oneshot(post_json("/predict", &sample_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["input"], sample_body());

    let predictions = body["predictions"].as_object().unwrap();
    let names: Vec<&str> = predictions.keys().map(String::as_str).collect();
    assert_eq!(names, FIXTURE_MODELS);

    for (name, p) in predictions {
        let confidence = p["confidence"].as_f64().unwrap();
        println!("  {}: {} ({:.3})", name, p["label"], confidence);
        assert_eq!(p["label"], "cotton", "{} should pick cotton", name);
        assert!((0.0..=1.0).contains(&confidence));
    }

    assert_eq!(body["consensus"]["label"], "cotton");
    println!("✓ Every model agrees on cotton");
}

#[tokio::test]
async fn test_predict_missing_ph() {
    let mut input = sample_body();
    input.as_object_mut().unwrap().remove("ph");

    let response = ready_app()
        .oneshot(post_json("/predict", &input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"error": "Missing field: ph"}));
}

#[tokio::test]
async fn test_predict_reports_first_declared_missing_field() {
    let input = json!({"temperature": "warm", "rainfall": 80});
    let response = ready_app()
        .oneshot(post_json("/predict", &input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Missing field: N");
}

#[tokio::test]
async fn test_predict_invalid_type() {
    let mut input = sample_body();
    input["K"] = json!("lots");

    let response = ready_app()
        .oneshot(post_json("/predict", &input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("K"));
}

#[tokio::test]
async fn test_predict_numeric_strings_accepted() {
    let mut input = sample_body();
    input["ph"] = json!("6.9");

    let response = ready_app()
        .oneshot(post_json("/predict", &input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["input"]["ph"], "6.9");
}

#[tokio::test]
async fn test_predict_malformed_json() {
    let response = ready_app()
        .oneshot(post_raw("/predict", "{\"N\": 118,"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_predict_non_object_body() {
    let response = ready_app()
        .oneshot(post_json("/predict", &json!([118, 46, 20])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Request body must be a JSON object");
}

#[tokio::test]
async fn test_predict_is_idempotent() {
    let app = ready_app();
    let mut bodies: Vec<Value> = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(post_json("/predict", &sample_body()))
            .await
            .unwrap();
        bodies.push(extract_json(response.into_body()).await);
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}

#[tokio::test]
async fn test_predict_unavailable() {
    let response = degraded_app()
        .oneshot(post_json("/predict", &sample_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Models not loaded");
}

#[tokio::test]
async fn test_predict_one_failing_classifier_fails_everything() {
    println!("\n=== Test: Failing Classifier ===");
    let state = state_with(vec![
        fixture_classifier("Logistic Regression"),
        NamedClassifier::new("Broken SVM", Box::new(BrokenClassifier)),
        fixture_classifier("Decision Tree"),
    ]);
    let app = build_router(AppState::new(PredictionService::new(state)));

    let response = app
        .oneshot(post_json("/predict", &sample_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Broken SVM"), "error should name the model: {}", error);
    assert!(body.get("predictions").is_none());
    println!("✓ {}", error);
}

#[tokio::test]
async fn test_predict_out_of_range_when_enforced() {
    let service =
        PredictionService::new(load_fixture_state()).with_ranges(Some(FeatureRanges::default()));
    let app = build_router(AppState::new(service));

    let mut input = sample_body();
    input["humidity"] = json!(140);
    let response = app
        .oneshot(post_json("/predict", &input))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"],
        "humidity value 140 out of valid range [0, 100]"
    );
}

// =============================================================================
// /sample-test
// =============================================================================

#[tokio::test]
async fn test_sample_endpoint() {
    let response = ready_app().oneshot(get("/sample-test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["expected"], "cotton");
    assert_eq!(body["sample_data"]["N"], 118.0);
    assert_eq!(body["sample_data"]["ph"], 6.9);
    assert_eq!(
        body["predictions"].as_object().unwrap().len(),
        FIXTURE_MODELS.len()
    );
    assert_eq!(body["predictions"]["Logistic Regression"]["label"], "cotton");
}

#[tokio::test]
async fn test_sample_endpoint_unavailable() {
    let response = degraded_app().oneshot(get("/sample-test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Models not loaded");
}

#[tokio::test]
async fn test_sample_endpoint_failing_classifier() {
    let state = state_with(vec![
        fixture_classifier("Naive Bayes"),
        NamedClassifier::new("Broken SVM", Box::new(BrokenClassifier)),
    ]);
    let app = build_router(AppState::new(PredictionService::new(state)));

    let response = app.oneshot(get("/sample-test")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body,
        json!({"error": "classifier 'Broken SVM' failed: probability head is missing"})
    );
}
