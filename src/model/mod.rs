//! Model module: the CNN classifier and the startup-time model host
//!
//! - `cnn`: classifier architecture built with Burn
//! - `host`: loads weights and labels once and exposes them read-only

pub mod cnn;
pub mod host;

pub use cnn::{PlantClassifier, PlantClassifierConfig};
pub use host::{LabelList, ModelHost};
