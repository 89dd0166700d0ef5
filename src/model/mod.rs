use serde::de::DeserializeOwned;
use std::{fs, path::Path, sync::Arc};

use crate::error::ModelError;

mod encoder;
mod forest;
#[cfg(feature = "torchscript")]
mod torchscript;

pub use encoder::LabelEncoder;
pub use forest::Forest;
#[cfg(feature = "torchscript")]
pub use torchscript::TorchClassifier;

/// Feature order: temperature, humidity, gas, flame.
pub const N_FEATURES: usize = 4;

pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f64; N_FEATURES]) -> Result<i64, ModelError>;
    fn n_classes(&self) -> usize;
}

/// Classifier plus the encoder that names its outputs.
#[derive(Clone)]
pub struct Model {
    classifier: Arc<dyn Classifier>,
    encoder: Arc<LabelEncoder>,
}

impl Model {
    pub fn new(classifier: Arc<dyn Classifier>, encoder: LabelEncoder) -> Self {
        Self {
            classifier,
            encoder: Arc::new(encoder),
        }
    }

    /// Loads both artifacts. Any failure here should stop the process.
    pub fn load(model_path: &Path, encoder_path: &Path) -> Result<Self, ModelError> {
        let classifier = load_classifier(model_path)?;
        let encoder = LabelEncoder::load(encoder_path)?;
        if encoder.classes().len() != classifier.n_classes() {
            tracing::warn!(
                "label encoder has {} classes, classifier has {}",
                encoder.classes().len(),
                classifier.n_classes()
            );
        }
        Ok(Self::new(classifier, encoder))
    }

    /// Class index for the features.
    pub fn predict(&self, features: &[f64; N_FEATURES]) -> Result<i64, ModelError> {
        self.classifier.predict(features)
    }

    pub fn decode(&self, index: i64) -> Result<String, ModelError> {
        self.encoder.decode(index)
    }

    /// Predicts and decodes in one step.
    pub fn classify(&self, features: &[f64; N_FEATURES]) -> Result<(i64, String), ModelError> {
        let idx = self.predict(features)?;
        let label = self.decode(idx)?;
        Ok((idx, label))
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }
}

/// Picks a backend from the file extension; JSON forests are the default.
pub fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    match ext {
        "pt" | "ts" => load_torchscript(path),
        _ => Ok(Arc::new(Forest::load(path)?)),
    }
}

#[cfg(feature = "torchscript")]
fn load_torchscript(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    Ok(Arc::new(TorchClassifier::load(path)?))
}

#[cfg(not(feature = "torchscript"))]
fn load_torchscript(path: &Path) -> Result<Arc<dyn Classifier>, ModelError> {
    Err(ModelError::Invalid(format!(
        "{} is a TorchScript model but fire_watch was built without the `torchscript` feature",
        path.display()
    )))
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let text = fs::read_to_string(path).map_err(|source| ModelError::Read {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ModelError::Parse {
        path: path.display().to_string(),
        source,
    })
}
