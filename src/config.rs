//! Server configuration
//!
//! Defaults, optionally overridden by a JSON file, then by command-line
//! flags and environment variables (see `main.rs`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::inference::{DEFAULT_IMAGE_SIZE, DEFAULT_TOP_K};
use crate::model::cnn::MIN_INPUT_SIZE;
use crate::utils::error::{LeafLensError, Result};

/// Largest accepted `image_size`
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Default upload limit for `/predict` (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Classifier weights recorded with the `CompactRecorder`
    pub model_path: PathBuf,
    /// Architecture config of the classifier (JSON); default architecture if unset
    pub model_config_path: Option<PathBuf>,
    /// JSON array of class names
    pub labels_path: PathBuf,
    /// Square input size of the classifier
    pub image_size: u32,
    /// Number of ranked classes returned by `/predict`
    pub top_k: usize,
    /// Number of inference worker threads
    pub workers: usize,
    /// Largest accepted request body for `/predict`
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            model_path: PathBuf::from("./models/leaf_cnn.mpk"),
            model_config_path: None,
            labels_path: PathBuf::from("./labels.json"),
            image_size: DEFAULT_IMAGE_SIZE,
            top_k: DEFAULT_TOP_K,
            workers: default_workers(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// One worker per available CPU
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ServerConfig {
    /// Load configuration from a JSON file; missing fields keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LeafLensError::Config(format!("cannot read {:?}: {}", path, e))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| LeafLensError::Config(format!("invalid config {:?}: {}", path, e)))
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LeafLensError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if (self.image_size as usize) < MIN_INPUT_SIZE || self.image_size > MAX_IMAGE_SIZE {
            return Err(LeafLensError::Config(format!(
                "image_size must be between {} and {}, got {}",
                MIN_INPUT_SIZE, MAX_IMAGE_SIZE, self.image_size
            )));
        }

        if self.top_k == 0 {
            return Err(LeafLensError::Config("top_k must be greater than 0".to_string()));
        }

        if self.workers == 0 {
            return Err(LeafLensError::Config("workers must be greater than 0".to_string()));
        }

        if self.max_upload_bytes == 0 {
            return Err(LeafLensError::Config(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
