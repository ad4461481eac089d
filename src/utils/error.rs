//! Error Handling Module
//!
//! Defines the error type for the LeafLens inference service.
//! Uses thiserror for ergonomic error definitions.
//!
//! Errors fall into three classes:
//! - startup failures (model, labels, configuration), fatal before serving
//! - decode failures, caused by the client upload
//! - inference failures, internal to the service

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for LeafLens operations
#[derive(Error, Debug)]
pub enum LeafLensError {
    /// The model artifact is missing or cannot be restored
    #[error("Failed to load model from '{0}': {1}")]
    ModelLoad(PathBuf, String),

    /// The label list is missing or malformed
    #[error("Failed to load labels from '{0}': {1}")]
    LabelsLoad(PathBuf, String),

    /// Invalid service configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Uploaded bytes are not a decodable raster image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Forward pass or output extraction failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LeafLensError {
    /// Whether the error was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, LeafLensError::Decode(_))
    }

    /// Whether the error prevents the service from starting
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            LeafLensError::ModelLoad(..) | LeafLensError::LabelsLoad(..) | LeafLensError::Config(_)
        )
    }
}

impl From<image::ImageError> for LeafLensError {
    fn from(err: image::ImageError) -> Self {
        LeafLensError::Decode(err.to_string())
    }
}

/// Convenience Result type for LeafLens operations
pub type Result<T> = std::result::Result<T, LeafLensError>;
