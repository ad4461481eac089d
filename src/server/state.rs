//! Application state for the LeafLens server
//!
//! Built once at startup and shared read-only by every request.

use std::sync::Arc;

use crate::backend::InferenceBackend;
use crate::config::ServerConfig;
use crate::inference::Predictor;

/// Shared application state
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Prediction pipeline backed by the inference workers
    pub predictor: Predictor<InferenceBackend>,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Predictor<InferenceBackend>) -> Self {
        Self { config, predictor }
    }
}

pub type SharedState = Arc<AppState>;
