//! # LeafLens
//!
//! HTTP inference service for leaf disease classification using the Burn framework.
//!
//! An uploaded leaf photo is decoded, resized to 160x160, normalized with the
//! ImageNet statistics and passed once through a pretrained CNN. The logits
//! are turned into probabilities and the most likely disease classes are
//! returned as JSON.
//!
//! ## Modules
//!
//! - `model`: CNN architecture and the startup-time model host
//! - `inference`: preprocessing, forward pass, top-k decoding, worker threads
//! - `server`: axum router, handlers and error mapping
//! - `config`: server configuration
//! - `utils`: logging and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leaflens::backend::{default_device, InferenceBackend};
//! use leaflens::model::ModelHost;
//! use leaflens::inference::Predictor;
//!
//! let device = default_device();
//! let host = ModelHost::<InferenceBackend>::load(model_path, None, labels_path, &device)?;
//! let predictor = Predictor::new(&host, 4)?;
//! let result = predictor.predict_bytes(bytes).await?;
//! ```

pub mod backend;
pub mod config;
pub mod inference;
pub mod model;
pub mod server;
pub mod utils;

pub use config::ServerConfig;
pub use inference::{ClassPrediction, PredictionResult, Predictor};
pub use model::{LabelList, ModelHost, PlantClassifier, PlantClassifierConfig};
pub use utils::error::{LeafLensError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
