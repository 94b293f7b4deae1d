/// Classification Error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    /// Inputs and labels must be parallel arrays
    #[error("inputs and labels differ in length ({inputs} inputs, {labels} labels)")]
    LengthMismatch {
        /// The number of inputs
        inputs: usize,
        /// The number of labels
        labels: usize,
    },

    /// There is nothing to train or evaluate on
    #[error("the dataset is empty")]
    EmptyDataset,

    /// Batches need at least one example
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    /// The embedding has no target sequence length yet
    #[error("the embedding sequence length has not been set")]
    SequenceLengthUnset,

    /// The model must be trained or loaded first
    #[error("the model has not been built")]
    ModelNotBuilt,

    /// No labels were found in the training targets
    #[error("no labels found in the training targets")]
    NoLabels,

    /// A saved model does not match the state it is loaded into
    #[error("incompatible saved model: {0}")]
    IncompatibleModel(String),
}
