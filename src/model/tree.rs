use super::{normalize, Classifier};
use crate::error::ClassifierError;
use crate::features::{ScaledVector, FEATURE_COUNT};
use serde::Deserialize;

const LEAF: i64 = -1;

/// A fitted binary decision tree in flat array form.
///
/// Node `i` splits on `feature[i]` with `x <= threshold[i]` going to
/// `children_left[i]`. Leaves have both children set to -1 and carry class
/// weights in `value[i]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

impl DecisionTree {
    pub fn new(
        children_left: Vec<i64>,
        children_right: Vec<i64>,
        feature: Vec<i64>,
        threshold: Vec<f64>,
        value: Vec<Vec<f64>>,
    ) -> Self {
        Self {
            children_left,
            children_right,
            feature,
            threshold,
            value,
        }
    }

    /// A tree made of one leaf.
    pub fn leaf(value: Vec<f64>) -> Self {
        Self::new(vec![LEAF], vec![LEAF], vec![-2], vec![-2.0], vec![value])
    }

    fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == LEAF
    }

    fn apply(&self, x: &[f64]) -> Result<usize, ClassifierError> {
        let mut node = 0usize;
        // every step moves to a higher index, so this terminates
        while !self.is_leaf(node) {
            let f = self.feature[node] as usize;
            let value = *x.get(f).ok_or(ClassifierError::DimensionMismatch {
                expected: f + 1,
                got: x.len(),
            })?;
            let next = if value <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
            node = next as usize;
        }
        Ok(node)
    }
}

impl Classifier for DecisionTree {
    fn family(&self) -> &'static str {
        "decision_tree"
    }

    fn n_classes(&self) -> usize {
        self.value.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("tree arrays have different lengths".to_string());
        }
        let width = self.n_classes();
        if width == 0 {
            return Err("tree nodes carry no class weights".to_string());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", i));
                }
                let value = &self.value[i];
                if value.len() != width {
                    return Err(format!("leaf {} has {} class weights", i, value.len()));
                }
                if value.iter().any(|v| !v.is_finite() || *v < 0.0) || value.iter().sum::<f64>() <= 0.0
                {
                    return Err(format!("leaf {} has invalid class weights", i));
                }
                continue;
            }
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {} has out-of-order child {}", i, child));
                }
            }
            if !(0..FEATURE_COUNT as i64).contains(&self.feature[i]) {
                return Err(format!(
                    "node {} splits on unknown feature {}",
                    i, self.feature[i]
                ));
            }
            if !self.threshold[i].is_finite() {
                return Err(format!("node {} has a non-finite threshold", i));
            }
        }
        Ok(())
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        let leaf = self.apply(x.as_slice())?;
        normalize(&self.value[leaf])
    }
}

/// Bagged decision trees; the distribution is the mean over trees.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(trees: Vec<DecisionTree>) -> Self {
        Self { trees }
    }
}

impl Classifier for RandomForest {
    fn family(&self) -> &'static str {
        "random_forest"
    }

    fn n_classes(&self) -> usize {
        self.trees.first().map_or(0, |t| t.n_classes())
    }

    fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        let width = self.n_classes();
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {}: {}", i, e))?;
            if tree.n_classes() != width {
                return Err(format!(
                    "tree {} has {} classes, expected {}",
                    i,
                    tree.n_classes(),
                    width
                ));
            }
        }
        Ok(())
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        let mut total = vec![0.0; self.n_classes()];
        for tree in &self.trees {
            for (acc, p) in total.iter_mut().zip(tree.predict_proba(x)?) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        Ok(total.into_iter().map(|p| p / n).collect())
    }
}
