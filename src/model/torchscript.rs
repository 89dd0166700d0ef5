use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use super::{Classifier, N_FEATURES};
use crate::error::ModelError;

/// TorchScript classifier producing `[1, C]` logits.
pub struct TorchClassifier {
    model: CModule,
    device: Device,
    n_classes: usize,
}

impl TorchClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::Cpu;
        let model = CModule::load_on_device(path, device).map_err(|e| {
            ModelError::Invalid(format!("failed to load TorchScript {}: {}", path.display(), e))
        })?;

        // Probe output shape with a dummy forward.
        let dummy = Tensor::zeros([1, N_FEATURES as i64], (Kind::Float, device));
        let out = model
            .forward_ts(&[dummy])
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let sz = out.size();
        if sz.len() != 2 || sz[0] != 1 || sz[1] < 1 {
            return Err(ModelError::Invalid(format!("unexpected model output size: {:?}", sz)));
        }

        Ok(Self {
            model,
            device,
            n_classes: sz[1] as usize,
        })
    }
}

impl Classifier for TorchClassifier {
    fn predict(&self, features: &[f64; N_FEATURES]) -> Result<i64, ModelError> {
        let x: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input = Tensor::from_slice(&x)
            .reshape([1, N_FEATURES as i64])
            .to_device(self.device);

        let logits = self
            .model
            .forward_ts(&[input])
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let idx = logits.argmax(1, false).int64_value(&[0]);
        Ok(idx)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
