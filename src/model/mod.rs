//! Classifier families and the capability interface the ensemble runs on.

pub mod linear;
pub mod naive_bayes;
pub mod neighbors;
#[cfg(feature = "torchscript")]
pub mod torch;
pub mod tree;

pub use linear::LogisticRegression;
pub use naive_bayes::GaussianNb;
pub use neighbors::KNeighbors;
pub use tree::{DecisionTree, RandomForest};

use crate::error::{ClassifierError, LoadError};
use crate::features::{ScaledVector, FEATURE_COUNT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A fitted classifier.
///
/// Positions in the returned distribution are the model's own class
/// positions; [`NamedClassifier`] maps them to encoded class indices.
pub trait Classifier: Send + Sync {
    /// Short family name used in logs.
    fn family(&self) -> &'static str;

    /// Width of the probability distribution.
    fn n_classes(&self) -> usize;

    /// Number of input features, when the fitted parameters pin it down.
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Structural checks run once at load time.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError>;

    /// Position of the predicted class. Defaults to the distribution's argmax.
    fn predict(&self, x: &ScaledVector) -> Result<usize, ClassifierError> {
        let proba = self.predict_proba(x)?;
        argmax(&proba).ok_or(ClassifierError::EmptyDistribution)
    }
}

/// A classifier as stored in the models artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierArtifact {
    #[serde(flatten)]
    pub kind: ClassifierKind,
    /// Encoded class index for each distribution position.
    #[serde(default)]
    pub classes: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierKind {
    LogisticRegression(LogisticRegression),
    GaussianNb(GaussianNb),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    KNeighbors(KNeighbors),
    Torchscript(TorchScriptArtifact),
}

/// Reference to a serialized TorchScript module on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TorchScriptArtifact {
    /// Relative paths resolve against the artifacts directory.
    pub path: PathBuf,
    pub n_classes: usize,
}

impl ClassifierArtifact {
    /// Turn stored parameters into a ready classifier.
    pub fn build(self, name: &str, base_dir: &Path) -> Result<NamedClassifier, LoadError> {
        let model: Box<dyn Classifier> = match self.kind {
            ClassifierKind::LogisticRegression(m) => Box::new(m),
            ClassifierKind::GaussianNb(m) => Box::new(m),
            ClassifierKind::DecisionTree(m) => Box::new(m),
            ClassifierKind::RandomForest(m) => Box::new(m),
            ClassifierKind::KNeighbors(m) => Box::new(m),
            ClassifierKind::Torchscript(artifact) => load_torchscript(name, artifact, base_dir)?,
        };

        let clf = NamedClassifier {
            name: name.to_string(),
            classes: self.classes,
            model,
        };
        clf.check()?;
        Ok(clf)
    }
}

#[cfg(feature = "torchscript")]
fn load_torchscript(
    name: &str,
    artifact: TorchScriptArtifact,
    base_dir: &Path,
) -> Result<Box<dyn Classifier>, LoadError> {
    let path = base_dir.join(&artifact.path);
    let model = torch::TorchScriptClassifier::load(&path, artifact.n_classes).map_err(|source| {
        LoadError::Torch {
            name: name.to_string(),
            source,
        }
    })?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "torchscript"))]
fn load_torchscript(
    name: &str,
    _artifact: TorchScriptArtifact,
    _base_dir: &Path,
) -> Result<Box<dyn Classifier>, LoadError> {
    Err(LoadError::UnsupportedFamily {
        name: name.to_string(),
        family: "torchscript",
    })
}

/// An ensemble member: a classifier and the name it is reported under.
pub struct NamedClassifier {
    name: String,
    classes: Option<Vec<usize>>,
    model: Box<dyn Classifier>,
}

impl NamedClassifier {
    pub fn new(name: impl Into<String>, model: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            classes: None,
            model,
        }
    }

    pub fn with_classes(mut self, classes: Vec<usize>) -> Self {
        self.classes = Some(classes);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> &'static str {
        self.model.family()
    }

    /// Structural checks on the fitted parameters and the class mapping.
    pub fn check(&self) -> Result<(), LoadError> {
        let invalid = |reason: String| LoadError::InvalidClassifier {
            name: self.name.clone(),
            reason,
        };
        self.model.validate().map_err(invalid)?;
        if let Some(n) = self.model.n_features() {
            if n != FEATURE_COUNT {
                return Err(invalid(format!(
                    "expects {} features, inputs have {}",
                    n, FEATURE_COUNT
                )));
            }
        }
        if let Some(classes) = &self.classes {
            if classes.len() != self.model.n_classes() {
                return Err(invalid(format!(
                    "classes lists {} entries but the model has {} classes",
                    classes.len(),
                    self.model.n_classes()
                )));
            }
        }
        Ok(())
    }

    /// Largest encoded class index this classifier can emit.
    pub fn max_class_index(&self) -> Option<usize> {
        match &self.classes {
            Some(classes) => classes.iter().copied().max(),
            None => self.model.n_classes().checked_sub(1),
        }
    }

    /// Encoded class index of the predicted class.
    pub fn predict(&self, x: &ScaledVector) -> Result<usize, ClassifierError> {
        let position = self.model.predict(x)?;
        match &self.classes {
            Some(classes) => classes
                .get(position)
                .copied()
                .ok_or(ClassifierError::UnknownClass {
                    index: position,
                    known: classes.len(),
                }),
            None => Ok(position),
        }
    }

    pub fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        self.model.predict_proba(x)
    }
}

impl std::fmt::Debug for NamedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedClassifier")
            .field("name", &self.name)
            .field("family", &self.model.family())
            .field("classes", &self.classes)
            .finish()
    }
}

/// Index of the first maximum, like numpy's argmax.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ if v.is_nan() => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Scale non-negative weights to sum to one.
pub(crate) fn normalize(weights: &[f64]) -> Result<Vec<f64>, ClassifierError> {
    let sum: f64 = weights.iter().sum();
    if weights.is_empty() {
        return Err(ClassifierError::EmptyDistribution);
    }
    if sum <= 0.0 || !sum.is_finite() {
        return Err(ClassifierError::Backend(format!(
            "cannot normalize weights summing to {}",
            sum
        )));
    }
    Ok(weights.iter().map(|w| w / sum).collect())
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn check_finite(name: &str, values: &[f64]) -> Result<(), String> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(format!("{} contains non-finite values", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_takes_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[f64::NAN, 0.1]), Some(1));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1000.0, 1000.0, 998.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-12);
        assert!(p[2] < p[0]);
    }

    #[test]
    fn test_artifact_with_class_mapping() {
        let artifact: ClassifierArtifact = serde_json::from_str(
            r#"{
                "type": "logistic_regression",
                "coef": [[1,0,0,0,0,0,0],[-1,0,0,0,0,0,0]],
                "intercept": [0, 0],
                "classes": [4, 9]
            }"#,
        )
        .unwrap();
        let clf = artifact.build("lr", Path::new(".")).unwrap();
        assert_eq!(clf.family(), "logistic_regression");
        assert_eq!(clf.max_class_index(), Some(9));

        let x = ScaledVector::new([2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(clf.predict(&x).unwrap(), 4);
    }

    #[test]
    fn test_check_rejects_mismatched_mapping() {
        let lr = LogisticRegression::new(vec![vec![0.0; 7]; 3], vec![0.0; 3]);
        let clf = NamedClassifier::new("lr", Box::new(lr)).with_classes(vec![0, 5]);
        assert!(matches!(
            clf.check(),
            Err(LoadError::InvalidClassifier { .. })
        ));

        let lr = LogisticRegression::new(vec![vec![0.0; 7]; 3], vec![0.0; 3]);
        let clf = NamedClassifier::new("lr", Box::new(lr)).with_classes(vec![0, 5, 2]);
        assert!(clf.check().is_ok());
        assert_eq!(clf.max_class_index(), Some(5));
    }

    #[test]
    fn test_class_mapping_must_match_width() {
        let artifact: ClassifierArtifact = serde_json::from_str(
            r#"{"type":"gaussian_nb","theta":[[0,0,0,0,0,0,0]],"var":[[1,1,1,1,1,1,1]],
                "class_prior":[1.0],"classes":[0,1]}"#,
        )
        .unwrap();
        let err = artifact.build("nb", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("classes lists 2 entries"));
    }

    #[cfg(not(feature = "torchscript"))]
    #[test]
    fn test_torchscript_requires_feature() {
        let artifact: ClassifierArtifact =
            serde_json::from_str(r#"{"type":"torchscript","path":"mlp.pt","n_classes":22}"#)
                .unwrap();
        assert!(matches!(
            artifact.build("mlp", Path::new("models")),
            Err(LoadError::UnsupportedFamily { .. })
        ));
    }
}
