//! Inference module: from uploaded bytes to ranked disease classes
//!
//! - `preprocess`: decode, resize and normalize an image
//! - `topk`: stable softmax and top-k ranking with label lookup
//! - `predictor`: the forward pass and the end-to-end pipeline
//! - `workers`: inference threads owning model replicas

pub mod predictor;
pub mod preprocess;
pub mod topk;
pub mod workers;

pub use predictor::{infer, predict_image, Predictor, DEFAULT_IMAGE_SIZE};
pub use preprocess::{decode_image, preprocess, NormalizedImage, IMAGENET_MEAN, IMAGENET_STD};
pub use topk::{softmax, top_k, ClassPrediction, PredictionResult, DEFAULT_TOP_K};
pub use workers::InferencePool;
