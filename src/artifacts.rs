//! Loading of the fitted artifacts into the shared service state.

use crate::config::ArtifactsConfig;
use crate::error::{ArtifactKind, LoadError};
use crate::labels::LabelDecoder;
use crate::model::{ClassifierArtifact, NamedClassifier};
use crate::scaler::Scaler;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Everything inference needs. Read-only once built.
#[derive(Debug)]
pub struct ServiceState {
    classifiers: Vec<NamedClassifier>,
    scaler: Scaler,
    decoder: LabelDecoder,
}

impl ServiceState {
    /// Assemble and cross-check a state.
    pub fn new(
        classifiers: Vec<NamedClassifier>,
        scaler: Scaler,
        decoder: LabelDecoder,
    ) -> Result<Self, LoadError> {
        scaler.validate().map_err(|reason| LoadError::Invalid {
            kind: ArtifactKind::Scaler,
            reason,
        })?;
        decoder.validate().map_err(|reason| LoadError::Invalid {
            kind: ArtifactKind::LabelEncoder,
            reason,
        })?;
        if classifiers.is_empty() {
            return Err(LoadError::EmptyEnsemble);
        }
        for clf in &classifiers {
            clf.check()?;
            if let Some(max) = clf.max_class_index() {
                if max >= decoder.len() {
                    return Err(LoadError::InvalidClassifier {
                        name: clf.name().to_string(),
                        reason: format!(
                            "emits class index {} but the label encoder knows {} classes",
                            max,
                            decoder.len()
                        ),
                    });
                }
            }
        }
        Ok(Self {
            classifiers,
            scaler,
            decoder,
        })
    }

    /// Classifiers in ensemble order.
    pub fn classifiers(&self) -> &[NamedClassifier] {
        &self.classifiers
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn decoder(&self) -> &LabelDecoder {
        &self.decoder
    }

    pub fn model_names(&self) -> Vec<String> {
        self.classifiers.iter().map(|c| c.name().to_string()).collect()
    }
}

/// Locations of the three artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub models: PathBuf,
    pub scaler: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    /// The default file names inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::from(&ArtifactsConfig {
            dir: dir.into(),
            ..ArtifactsConfig::default()
        })
    }
}

impl From<&ArtifactsConfig> for ArtifactPaths {
    fn from(cfg: &ArtifactsConfig) -> Self {
        Self {
            dir: cfg.dir.clone(),
            models: cfg.dir.join(&cfg.models_file),
            scaler: cfg.dir.join(&cfg.scaler_file),
            label_encoder: cfg.dir.join(&cfg.label_encoder_file),
        }
    }
}

/// Reads artifacts from disk. No partial state is ever produced.
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn load(&self) -> Result<ServiceState, LoadError> {
        let result = self.load_all();
        match &result {
            Ok(state) => info!(
                models = ?state.model_names(),
                classes = state.decoder().len(),
                "Model components loaded successfully"
            ),
            Err(e) => error!(error = %e, dir = %self.paths.dir.display(), "Error loading model components"),
        }
        result
    }

    fn load_all(&self) -> Result<ServiceState, LoadError> {
        let raw_models: Map<String, Value> = read_json(ArtifactKind::Models, &self.paths.models)?;
        let scaler: Scaler = read_json(ArtifactKind::Scaler, &self.paths.scaler)?;
        let decoder: LabelDecoder =
            read_json(ArtifactKind::LabelEncoder, &self.paths.label_encoder)?;

        // object order is kept, and is the ensemble order
        let mut classifiers = Vec::with_capacity(raw_models.len());
        for (name, raw) in raw_models {
            let artifact: ClassifierArtifact =
                serde_json::from_value(raw).map_err(|source| LoadError::InvalidClassifier {
                    name: name.clone(),
                    reason: source.to_string(),
                })?;
            let clf = artifact.build(&name, &self.paths.dir)?;
            info!(model = %name, family = clf.family(), "Loaded classifier");
            classifiers.push(clf);
        }

        ServiceState::new(classifiers, scaler, decoder)
    }
}

fn read_json<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T, LoadError> {
    info!(artifact = %kind, path = %path.display(), "Loading artifact");
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        kind,
        path: path.to_path_buf(),
        source,
    })
}
