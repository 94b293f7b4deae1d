/// Label index and multi-label encoding
pub mod labels;

/// Page-shuffled batch generation
pub mod generator;

/// The framework model seam
pub mod model;

/// Configuration
pub mod config;

/// Errors
pub mod error;

/// The classification model wrapper
pub mod classification;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// Classification reports
pub mod report;

/// Evaluation
pub mod evaluation;

/// Saving and loading
pub mod persistence;

pub use classification::ClassificationModel;
pub use config::{EvaluateConfig, ModelInfo, PredictConfig, TrainingConfig};
pub use error::ClassificationError;
pub use generator::{Batch, BatchGenerator};
pub use inference::{Candidate, ClassificationResult, Prediction, Predictions, Sentences};
pub use labels::{LabelError, LabelIndex, MultiLabelBinarizer, Target};
pub use model::{Architecture, Classifier, Inputs, ModelShape};
pub use report::ClassificationReport;
