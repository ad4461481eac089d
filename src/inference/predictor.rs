//! Inference Predictor Module
//!
//! Runs the full prediction pipeline: decode, preprocess, forward pass,
//! softmax and top-k. The pipeline itself is synchronous; [`Predictor`]
//! dispatches it to the inference workers for async callers.

use std::sync::Arc;
use std::time::Instant;

use burn::tensor::{backend::Backend, Tensor};
use image::DynamicImage;
use tracing::debug;

use super::preprocess::{decode_image, preprocess};
use super::topk::{top_k, PredictionResult, DEFAULT_TOP_K};
use super::workers::InferencePool;
use crate::model::cnn::MIN_INPUT_SIZE;
use crate::model::{LabelList, ModelHost, PlantClassifier};
use crate::utils::error::{LeafLensError, Result};
use crate::utils::format_latency;

/// Default square input size of the classifier
pub const DEFAULT_IMAGE_SIZE: u32 = 160;

/// Single forward pass returning the logits of the first batch item
///
/// Runs without gradient tracking: the inference backend has no autodiff.
pub fn infer<B: Backend>(model: &PlantClassifier<B>, input: Tensor<B, 4>) -> Result<Vec<f32>> {
    let [batch, _, height, width] = input.dims();
    if batch != 1 {
        return Err(LeafLensError::Inference(format!(
            "expected a batch of 1, got {}",
            batch
        )));
    }
    if height < MIN_INPUT_SIZE || width < MIN_INPUT_SIZE {
        return Err(LeafLensError::Inference(format!(
            "input of {}x{} is smaller than the minimum {}x{}",
            height, width, MIN_INPUT_SIZE, MIN_INPUT_SIZE
        )));
    }

    let logits = model.forward(input);
    let [_, num_classes] = logits.dims();

    let values: Vec<f32> = logits
        .into_data()
        .to_vec()
        .map_err(|e| LeafLensError::Inference(format!("failed to read logits: {:?}", e)))?;

    if values.len() != num_classes {
        return Err(LeafLensError::Inference(format!(
            "expected {} logits, got {}",
            num_classes,
            values.len()
        )));
    }

    Ok(values)
}

/// Preprocess an image, run the model and rank the classes
pub fn predict_image<B: Backend>(
    model: &PlantClassifier<B>,
    device: &B::Device,
    image: &DynamicImage,
    image_size: u32,
    k: usize,
    labels: &LabelList,
) -> Result<PredictionResult> {
    let input = preprocess(image, image_size).into_tensor::<B>(device);

    let start = Instant::now();
    let logits = infer(model, input)?;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let result = top_k(&logits, k, labels);
    if let Some(top) = &result.top1 {
        debug!(
            "Predicted {} (class {}, p={:.3}) in {}",
            top.label,
            top.index,
            top.prob,
            format_latency(elapsed_ms)
        );
    }

    Ok(result)
}

/// Async front of the prediction pipeline
pub struct Predictor<B: Backend> {
    pool: InferencePool<B>,
    labels: Arc<LabelList>,

    /// Target image size for preprocessing
    pub image_size: u32,

    /// Number of ranked classes to return
    pub top_k: usize,
}

impl<B: Backend> Predictor<B> {
    /// Spawn `workers` inference threads over replicas of the host's model
    pub fn new(host: &ModelHost<B>, workers: usize) -> Result<Self> {
        Ok(Self {
            pool: InferencePool::spawn(host, workers)?,
            labels: host.labels().clone(),
            image_size: DEFAULT_IMAGE_SIZE,
            top_k: DEFAULT_TOP_K,
        })
    }

    /// Configure image size
    pub fn with_image_size(mut self, size: u32) -> Self {
        self.image_size = size;
        self
    }

    /// Configure how many classes are returned
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Predict on raw uploaded bytes
    ///
    /// Undecodable bytes yield [`LeafLensError::Decode`]; anything failing
    /// after decoding is an inference error.
    pub async fn predict_bytes(&self, bytes: Vec<u8>) -> Result<PredictionResult> {
        let labels = self.labels.clone();
        let image_size = self.image_size;
        let k = self.top_k;

        self.pool
            .run(move |model, device| {
                let image = decode_image(&bytes)?;
                drop(bytes);
                predict_image(model, device, &image, image_size, k, &labels)
            })
            .await
    }
}
