//! Model Host
//!
//! Loads the classifier weights and the label list once at startup and
//! exposes them read-only for the rest of the process lifetime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use burn::config::Config;
use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use tracing::{info, warn};

use super::cnn::{PlantClassifier, PlantClassifierConfig};
use crate::utils::error::{LeafLensError, Result};

/// Ordered class names; index `i` names logit `i`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelList {
    labels: Vec<String>,
}

impl LabelList {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    /// Load a JSON array of label strings
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| LeafLensError::LabelsLoad(path.to_path_buf(), e.to_string()))?;

        Self::from_json(&json).map_err(|e| LeafLensError::LabelsLoad(path.to_path_buf(), e))
    }

    /// Parse a JSON array of label strings; the array must not be empty
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let labels: Vec<String> = serde_json::from_str(json)
            .map_err(|e| format!("expected a JSON array of strings: {}", e))?;

        if labels.is_empty() {
            return Err("label list is empty".to_string());
        }

        Ok(Self::new(labels))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Human label for a class index, never fails
    ///
    /// Indices past the end of the list get a `class_{index}` placeholder.
    pub fn label_for(&self, index: usize) -> String {
        match self.get(index) {
            Some(label) => label.to_string(),
            None => format!("class_{}", index),
        }
    }
}

/// Loaded model and labels, immutable after construction
pub struct ModelHost<B: Backend> {
    model: PlantClassifier<B>,
    config: PlantClassifierConfig,
    labels: Arc<LabelList>,
    device: B::Device,
}

impl<B: Backend> ModelHost<B> {
    /// Load the label list, the architecture config and the weights
    ///
    /// Without a config file the default architecture is used with one
    /// output per label.
    pub fn load(
        model_path: &Path,
        model_config_path: Option<&Path>,
        labels_path: &Path,
        device: &B::Device,
    ) -> Result<Self> {
        let labels = LabelList::load(labels_path)?;
        info!("Loaded {} labels from {:?}", labels.len(), labels_path);

        let config = match model_config_path {
            Some(path) => PlantClassifierConfig::load(path).map_err(|e| {
                LeafLensError::ModelLoad(path.to_path_buf(), format!("invalid model config: {:?}", e))
            })?,
            None => PlantClassifierConfig::new().with_num_classes(labels.len()),
        };

        let model = load_weights::<B>(model_path, &config, device)?;
        info!(
            "Loaded model from {:?} ({} classes, {} input)",
            model_path, config.num_classes, config.input_size
        );

        Ok(Self::from_parts(model, config, labels, device.clone()))
    }

    /// Assemble a host from an already built model
    pub fn from_parts(
        model: PlantClassifier<B>,
        config: PlantClassifierConfig,
        labels: LabelList,
        device: B::Device,
    ) -> Self {
        if labels.len() != model.num_classes() {
            warn!(
                "Label count ({}) does not match model outputs ({}); missing labels become placeholders",
                labels.len(),
                model.num_classes()
            );
        }

        Self {
            model,
            config,
            labels: Arc::new(labels),
            device,
        }
    }

    pub fn model(&self) -> &PlantClassifier<B> {
        &self.model
    }

    pub fn config(&self) -> &PlantClassifierConfig {
        &self.config
    }

    pub fn labels(&self) -> &Arc<LabelList> {
        &self.labels
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn num_classes(&self) -> usize {
        self.model.num_classes()
    }
}

/// Restore classifier weights recorded with the `CompactRecorder`
fn load_weights<B: Backend>(
    path: &Path,
    config: &PlantClassifierConfig,
    device: &B::Device,
) -> Result<PlantClassifier<B>> {
    let recorder = CompactRecorder::new();
    PlantClassifier::new(config, device)
        .load_file(PathBuf::from(path), &recorder, device)
        .map_err(|e| LeafLensError::ModelLoad(path.to_path_buf(), format!("{:?}", e)))
}
