use std::path::Path;

use super::generator::{Batch, Batches};

/// The dimensions a framework model is built for
#[derive(burn::config::Config, Debug, PartialEq)]
pub struct ModelShape {
    /// The number of token ids the embedding can produce
    pub vocab_size: usize,

    /// The width of each embedding vector
    pub embedding_size: usize,

    /// The padded length of every input sequence
    pub sequence_length: usize,

    /// The number of output classes
    pub num_labels: usize,

    /// Whether classes are predicted independently (sigmoid) rather than exclusively (softmax)
    pub multi_label: bool,

    /// Whether an all-zero segment input accompanies the token ids
    pub is_bert: bool,
}

/// Padded model inputs for prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    /// Token ids: `[examples][sequence_length]`
    pub tokens: Vec<Vec<usize>>,

    /// All-zero segment ids of the same shape, for embeddings that need them
    pub segments: Option<Vec<Vec<usize>>>,
}

impl Inputs {
    /// The number of examples
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no examples
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl From<Batch> for Inputs {
    fn from(batch: Batch) -> Self {
        Self {
            tokens: batch.tokens,
            segments: batch.segments,
        }
    }
}

/// Validation batches and the number of them to pull after each epoch
pub struct Validation<'a> {
    /// The validation batch stream
    pub batches: &'a mut Batches<'a>,

    /// Batches per validation pass
    pub steps: usize,
}

/// A framework model that can be trained from a batch stream and produce class scores
pub trait Classifier {
    /// Train for `epochs` epochs of `steps_per_epoch` batches pulled from `train`
    fn fit_generator(
        &mut self,
        train: &mut Batches<'_>,
        steps_per_epoch: usize,
        epochs: usize,
        validation: Option<Validation<'_>>,
        class_weight: Option<&[f32]>,
    ) -> anyhow::Result<()>;

    /// Produce a `[examples][num_labels]` score matrix
    fn predict(&self, inputs: &Inputs, batch_size: Option<usize>)
        -> anyhow::Result<Vec<Vec<f32>>>;

    /// Persist the weights under the given path
    fn save(&self, path: &Path) -> anyhow::Result<()>;
}

/// Builds a framework model for a given shape
pub trait Architecture {
    /// The model this architecture builds
    type Model: Classifier;

    /// Build a fresh model, seeding the embedding from `weights` when given
    fn build(&self, shape: &ModelShape, weights: Option<Vec<f32>>)
        -> anyhow::Result<Self::Model>;

    /// Restore a model saved with [`Classifier::save`]
    fn load(&self, shape: &ModelShape, path: &Path) -> anyhow::Result<Self::Model>;

    /// Persist the architecture's hyper-parameters
    fn save_config(&self, path: &Path) -> anyhow::Result<()>;
}
