use burn::{
    module::{Module, Param},
    nn::{
        conv::Conv1dConfig, DropoutConfig, EmbeddingConfig, EmbeddingRecord, LinearConfig,
        PaddingConfig1d,
    },
    tensor::{backend::Backend, Data, Shape, Tensor},
    LearningRate,
};

use crate::pipelines::text_classification::ModelShape;

use super::model::Model;

/// Hyper-parameters of the convolutional classifier
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Number of convolution filters
    #[config(default = 250)]
    pub filters: usize,

    /// Width of each convolution filter, in tokens
    #[config(default = 3)]
    pub kernel_size: usize,

    /// Units in the hidden dense layer
    #[config(default = 250)]
    pub hidden_dims: usize,

    /// Dropout rate after the embedding and after the hidden layer
    #[config(default = 0.2)]
    pub dropout: f64,

    /// Keep training pretrained embedding vectors instead of freezing them
    #[config(default = false)]
    pub trainable_embedding: bool,

    /// Adam learning rate
    #[config(default = 1e-3)]
    pub learning_rate: LearningRate,

    /// Adam epsilon
    #[config(default = 1e-8)]
    pub adam_epsilon: f32,
}

impl Config {
    /// Initializes a model for the given shape, seeding the embedding from a row-major
    /// `[vocab_size, embedding_size]` matrix when one is given
    pub fn init<B: Backend>(
        &self,
        shape: &ModelShape,
        weights: Option<Vec<f32>>,
        device: &B::Device,
    ) -> anyhow::Result<Model<B>> {
        if shape.sequence_length < self.kernel_size {
            return Err(anyhow!(
                "Sequence length {} is shorter than the kernel size {}",
                shape.sequence_length,
                self.kernel_size
            ));
        }

        if shape.num_labels == 0 {
            return Err(anyhow!("Classes are not defined in the model shape"));
        }

        let mut embedding =
            EmbeddingConfig::new(shape.vocab_size, shape.embedding_size).init(device);

        let freeze_embedding = weights.is_some() && !self.trainable_embedding;

        if let Some(weights) = weights {
            let expected = shape.vocab_size * shape.embedding_size;

            if weights.len() != expected {
                return Err(anyhow!(
                    "Expected {} pretrained embedding values, got {}",
                    expected,
                    weights.len()
                ));
            }

            let weight = Tensor::from_floats(
                Data::new(
                    weights,
                    Shape::new([shape.vocab_size, shape.embedding_size]),
                ),
                device,
            );

            embedding = embedding.load_record(EmbeddingRecord {
                weight: Param::from_tensor(weight),
            });
        }

        let conv = Conv1dConfig::new(shape.embedding_size, self.filters, self.kernel_size)
            .with_padding(PaddingConfig1d::Valid)
            .init(device);

        Ok(Model {
            embedding,
            dropout: DropoutConfig::new(self.dropout).init(),
            conv,
            hidden: LinearConfig::new(self.filters, self.hidden_dims).init(device),
            output: LinearConfig::new(self.hidden_dims, shape.num_labels).init(device),
            n_classes: shape.num_labels,
            multi_label: shape.multi_label,
            freeze_embedding,
        })
    }
}
