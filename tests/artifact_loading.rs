//! Integration tests for loading fitted artifacts from disk
//!
//! Run with: cargo test --test artifact_loading -- --nocapture

mod common;

use common::*;
use crop_predictor::error::{ArtifactKind, LoadError};
use crop_predictor::{ArtifactPaths, ArtifactStore};
use serde_json::json;
use std::fs;

fn load_from(dir: &std::path::Path) -> Result<crop_predictor::ServiceState, LoadError> {
    ArtifactStore::new(ArtifactPaths::in_dir(dir)).load()
}

#[test]
fn test_fixture_artifacts_load_in_file_order() {
    println!("\n=== Test: Load Fixture Artifacts ===");
    let state = load_fixture_state();

    assert_eq!(state.model_names(), FIXTURE_MODELS);
    assert_eq!(state.decoder().classes(), FIXTURE_LABELS);

    let families: Vec<&str> = state.classifiers().iter().map(|c| c.family()).collect();
    assert_eq!(
        families,
        [
            "logistic_regression",
            "decision_tree",
            "random_forest",
            "gaussian_nb",
            "k_neighbors"
        ]
    );
    println!("✓ Loaded {} classifiers", state.classifiers().len());
}

#[test]
fn test_missing_scaler_aborts_load() {
    let dir = copy_fixtures();
    fs::remove_file(dir.path().join("scaler.json")).unwrap();

    let err = load_from(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Io {
            kind: ArtifactKind::Scaler,
            ..
        }
    ));
}

#[test]
fn test_corrupt_label_encoder_aborts_load() {
    let dir = copy_fixtures();
    fs::write(dir.path().join("label_encoder.json"), "{\"classes\": [\"apple\",").unwrap();

    let err = load_from(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Parse {
            kind: ArtifactKind::LabelEncoder,
            ..
        }
    ));
}

#[test]
fn test_one_bad_classifier_aborts_whole_ensemble() {
    let dir = copy_fixtures();
    let path = dir.path().join("trained_models.json");
    let mut models = read_json(&path);
    models["Naive Bayes"]["var"][0][0] = json!(0.0);
    write_json(&path, &models);

    match load_from(dir.path()) {
        Err(LoadError::InvalidClassifier { name, reason }) => {
            assert_eq!(name, "Naive Bayes");
            assert!(reason.contains("var"));
        }
        other => panic!("expected InvalidClassifier, got {:?}", other),
    }
}

#[test]
fn test_unknown_family_rejected() {
    let dir = copy_fixtures();
    let path = dir.path().join("trained_models.json");
    let mut models = read_json(&path);
    models["SVM"] = json!({"type": "svc", "support_vectors": []});
    write_json(&path, &models);

    match load_from(dir.path()) {
        Err(LoadError::InvalidClassifier { name, reason }) => {
            assert_eq!(name, "SVM");
            assert!(reason.contains("svc"));
        }
        other => panic!("expected InvalidClassifier, got {:?}", other),
    }
}

#[test]
fn test_decoder_must_cover_every_class() {
    let dir = copy_fixtures();
    write_json(
        &dir.path().join("label_encoder.json"),
        &json!({"classes": ["apple", "banana", "cotton"]}),
    );

    let err = load_from(dir.path()).unwrap_err();
    assert!(
        err.to_string().contains("label encoder knows 3 classes"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_scaler_width_checked() {
    let dir = copy_fixtures();
    write_json(
        &dir.path().join("scaler.json"),
        &json!({"type": "standard", "mean": [0, 0, 0], "scale": [1, 1, 1]}),
    );

    let err = load_from(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            kind: ArtifactKind::Scaler,
            ..
        }
    ));
}

#[test]
fn test_empty_ensemble_rejected() {
    let dir = copy_fixtures();
    write_json(&dir.path().join("trained_models.json"), &json!({}));
    assert!(matches!(
        load_from(dir.path()),
        Err(LoadError::EmptyEnsemble)
    ));
}

#[test]
fn test_classifier_with_wrong_feature_count_rejected() {
    let dir = copy_fixtures();
    let path = dir.path().join("trained_models.json");
    let mut models = read_json(&path);
    models["Logistic Regression"] = json!({
        "type": "logistic_regression",
        "coef": [[1.0, 2.0], [0.5, 0.5]],
        "intercept": [0.0, 0.0]
    });
    write_json(&path, &models);

    let err = load_from(dir.path()).unwrap_err();
    assert!(err.to_string().contains("expects 2 features"));
}
