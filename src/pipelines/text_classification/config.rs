use super::model::ModelShape;

/// Hyper-parameters for [`fit`](super::ClassificationModel::fit)
#[derive(burn::config::Config, Debug)]
pub struct TrainingConfig {
    /// Batch size, halved when it exceeds the number of training examples
    #[config(default = 64)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 5)]
    pub epochs: usize,

    /// Weight classes inversely to their frequency in the training labels
    #[config(default = false)]
    pub class_weight: bool,

    /// Tokens seen fewer times than this are left out of the vocabulary
    #[config(default = 3)]
    pub min_count: usize,

    /// Seed for page shuffling
    pub seed: Option<u64>,
}

/// Options for [`predict`](super::ClassificationModel::predict)
#[derive(burn::config::Config, Debug)]
pub struct PredictConfig {
    /// Batch size used by the framework during inference
    pub batch_size: Option<usize>,

    /// Return ranked candidates with confidences instead of bare labels
    #[config(default = false)]
    pub output_dict: bool,

    /// Score at or above which a label is assigned in multi-label mode
    #[config(default = 0.6)]
    pub multi_label_threshold: f32,

    /// Log inputs, raw scores and decisions
    #[config(default = false)]
    pub debug_info: bool,
}

/// Options for [`evaluate`](super::ClassificationModel::evaluate)
#[derive(burn::config::Config, Debug)]
pub struct EvaluateConfig {
    /// Batch size used by the framework during inference
    pub batch_size: Option<usize>,

    /// Decimal places in the printed report
    #[config(default = 4)]
    pub digits: usize,

    /// Score at or above which a label is assigned in multi-label mode
    #[config(default = 0.6)]
    pub multi_label_threshold: f32,

    /// Log a random sample of examples with their predictions
    #[config(default = false)]
    pub debug_info: bool,

    /// Seed for the debug sample
    pub seed: Option<u64>,
}

/// The persisted description of a trained classification model
#[derive(burn::config::Config, Debug)]
pub struct ModelInfo {
    /// The shape the framework model was built for
    pub shape: ModelShape,

    /// Class labels in id order
    pub labels: Vec<String>,

    /// Whether the model is multi-label
    pub multi_label: bool,
}
