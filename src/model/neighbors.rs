use super::{check_finite, normalize, Classifier};
use crate::error::ClassifierError;
use crate::features::ScaledVector;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weights {
    #[default]
    Uniform,
    Distance,
}

/// k-nearest-neighbours vote over the stored training points.
#[derive(Debug, Clone, Deserialize)]
pub struct KNeighbors {
    n_neighbors: usize,
    points: Vec<Vec<f64>>,
    labels: Vec<usize>,
    n_classes: usize,
    #[serde(default)]
    weights: Weights,
}

impl KNeighbors {
    pub fn new(
        n_neighbors: usize,
        points: Vec<Vec<f64>>,
        labels: Vec<usize>,
        n_classes: usize,
    ) -> Self {
        Self {
            n_neighbors,
            points,
            labels,
            n_classes,
            weights: Weights::Uniform,
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    /// Indices of the k closest points, ties broken by storage order.
    fn neighbors(&self, x: &[f64]) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let d2: f64 = p.iter().zip(x).map(|(a, b)| (a - b).powi(2)).sum();
                (i, d2.sqrt())
            })
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(self.n_neighbors);
        distances
    }
}

impl Classifier for KNeighbors {
    fn family(&self) -> &'static str {
        "k_neighbors"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn n_features(&self) -> Option<usize> {
        self.points.first().map(Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        if self.n_neighbors == 0 {
            return Err("n_neighbors must be positive".to_string());
        }
        if self.points.len() < self.n_neighbors {
            return Err(format!(
                "{} points stored for n_neighbors = {}",
                self.points.len(),
                self.n_neighbors
            ));
        }
        if self.labels.len() != self.points.len() {
            return Err("labels and points differ in length".to_string());
        }
        let width = self.points[0].len();
        for p in &self.points {
            if p.len() != width {
                return Err("points have different lengths".to_string());
            }
            check_finite("points", p)?;
        }
        if let Some(bad) = self.labels.iter().find(|&&l| l >= self.n_classes) {
            return Err(format!("label {} exceeds n_classes {}", bad, self.n_classes));
        }
        Ok(())
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        let neighbors = self.neighbors(x.as_slice());
        let mut votes = vec![0.0; self.n_classes];

        match self.weights {
            Weights::Uniform => {
                for (i, _) in &neighbors {
                    votes[self.labels[*i]] += 1.0;
                }
            }
            Weights::Distance => {
                // exact matches take all the weight
                let exact: Vec<usize> = neighbors
                    .iter()
                    .filter(|(_, d)| *d == 0.0)
                    .map(|(i, _)| *i)
                    .collect();
                if exact.is_empty() {
                    for (i, d) in &neighbors {
                        votes[self.labels[*i]] += 1.0 / d;
                    }
                } else {
                    for i in exact {
                        votes[self.labels[i]] += 1.0;
                    }
                }
            }
        }
        normalize(&votes)
    }
}
