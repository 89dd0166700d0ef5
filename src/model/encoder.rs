use serde::Deserialize;
use std::path::Path;

use super::read_json;
use crate::error::ModelError;

#[derive(Debug, Deserialize)]
struct EncoderJson {
    classes: Vec<String>,
}

/// Maps class indices back to status labels.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw: EncoderJson = read_json(path)?;
        Self::new(raw.classes)
    }

    pub fn new(classes: Vec<String>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::Invalid("label encoder has no classes".to_string()));
        }
        Ok(Self { classes })
    }

    /// Upper-cased label for `index`.
    pub fn decode(&self, index: i64) -> Result<String, ModelError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(|label| label.to_uppercase())
            .ok_or(ModelError::UnknownClass {
                index,
                known: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
