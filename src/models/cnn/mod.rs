/// Convolutional classifier over word embeddings
pub mod model;

/// The model configuration
pub mod config;

/// Batcher
pub mod batcher;

/// The framework model seam for text classification
pub mod classifier;

pub use batcher::{Batcher, Infer, Train};
pub use classifier::{CnnArchitecture, CnnClassifier};
pub use config::Config;
pub use model::{Model, ModelRecord, Output};
