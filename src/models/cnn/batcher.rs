use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{
    pipelines::text_classification::Batch,
    utils::tensors::{float_matrix, int_matrix},
};

/// Struct for training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Padded token ids: `[batch_size, sequence_length]`
    pub tokens: Tensor<B, 2, Int>,

    /// One-hot or multi-hot targets: `[batch_size, n_classes]`
    pub targets: Tensor<B, 2>,
}

/// Struct for inference batch for text classification
#[derive(Clone, Debug, new)]
pub struct Infer<B: Backend> {
    /// Padded token ids: `[batch_size, sequence_length]`
    pub tokens: Tensor<B, 2, Int>,
}

/// Moves generator batches and padded token rows onto a device
#[derive(Clone, Debug, new)]
pub struct Batcher<B: Backend> {
    /// Device on which to perform computation (e.g., CPU or CUDA device)
    device: B::Device,
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<Vec<usize>, Infer<B>> for Batcher<B> {
    /// Stacks padded token rows into an inference batch
    fn batch(&self, items: Vec<Vec<usize>>) -> Infer<B> {
        Infer {
            tokens: int_matrix(&items, &self.device),
        }
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend> dataloader::batcher::Batcher<Batch, Train<B>> for Batcher<B> {
    /// Concatenates generator pages into one training batch
    fn batch(&self, items: Vec<Batch>) -> Train<B> {
        let (tokens, targets): (Vec<_>, Vec<_>) = items
            .into_iter()
            .flat_map(|batch| batch.tokens.into_iter().zip(batch.targets))
            .unzip();

        Train {
            tokens: int_matrix(&tokens, &self.device),
            targets: float_matrix(&targets, &self.device),
        }
    }
}
