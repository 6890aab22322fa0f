//! TorchScript networks exported from the training pipeline.

use super::Classifier;
use crate::error::ClassifierError;
use crate::features::{ScaledVector, FEATURE_COUNT};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

pub struct TorchScriptClassifier {
    module: CModule,
    device: Device,
    n_classes: usize,
}

impl TorchScriptClassifier {
    pub fn load(path: &Path, n_classes: usize) -> Result<Self, tch::TchError> {
        let device = Device::Cpu;
        let module = CModule::load_on_device(path, device)?;
        Ok(Self {
            module,
            device,
            n_classes,
        })
    }

    fn logits(&self, x: &[f64]) -> Result<Tensor, ClassifierError> {
        let input: Vec<f32> = x.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&input)
            .reshape([1, FEATURE_COUNT as i64])
            .to_device(self.device);

        // expect [1, n_classes]
        let out = self
            .module
            .forward_ts(&[input])
            .map_err(|e| ClassifierError::Backend(e.to_string()))?;
        let size = out.size();
        if size.len() != 2 || size[0] != 1 {
            return Err(ClassifierError::Backend(format!(
                "unexpected model output size: {:?}",
                size
            )));
        }
        if size[1] as usize != self.n_classes {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.n_classes,
                got: size[1] as usize,
            });
        }
        Ok(out)
    }
}

impl Classifier for TorchScriptClassifier {
    fn family(&self) -> &'static str {
        "torchscript"
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, x: &ScaledVector) -> Result<Vec<f64>, ClassifierError> {
        let probs = self.logits(x.as_slice())?.softmax(-1, Kind::Double);
        Ok((0..self.n_classes as i64)
            .map(|i| probs.double_value(&[0, i]))
            .collect())
    }
}
