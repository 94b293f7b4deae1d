use burn::{
    module::Module,
    nn::{conv::Conv1d, loss::CrossEntropyLossConfig, Dropout, Embedding, Linear},
    tensor::{
        activation::{log_softmax, relu, sigmoid, softmax},
        backend::Backend,
        Data, Int, Shape, Tensor,
    },
};

/// Keeps log-probabilities finite in the binary cross-entropy
const EPSILON: f32 = 1e-7;

/// A convolutional text classifier over word embeddings
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    /// Token embeddings, optionally pretrained
    pub embedding: Embedding<B>,

    /// Dropout after the embedding and after the hidden layer
    pub dropout: Dropout,

    /// One-dimensional convolution across the sequence
    pub conv: Conv1d<B>,

    /// Dense layer after global max pooling
    pub hidden: Linear<B>,

    /// Linear layer producing one logit per class
    pub output: Linear<B>,

    /// Total number of classes
    pub n_classes: usize,

    /// Score classes independently with a sigmoid
    pub multi_label: bool,

    /// Keep pretrained embedding vectors fixed during training
    pub freeze_embedding: bool,
}

/// The loss and outputs of a training step
#[derive(Debug)]
pub struct Output<B: Backend> {
    /// The mean loss over the batch
    pub loss: Tensor<B, 1>,

    /// Class logits: `[batch_size, n_classes]`
    pub output: Tensor<B, 2>,

    /// One-hot or multi-hot targets: `[batch_size, n_classes]`
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> Model<B> {
    /// Class logits for a batch of token ids
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, _seq_length] = tokens.dims();

        let embedded = self.embedding.forward(tokens);
        let embedded = if self.freeze_embedding {
            embedded.detach()
        } else {
            embedded
        };

        // [batch, seq, dims] -> [batch, dims, seq] for the convolution
        let x = self.dropout.forward(embedded).swap_dims(1, 2);
        let x = relu(self.conv.forward(x));

        let [_, filters, _] = x.dims();
        let x = x.max_dim(2).reshape([batch_size, filters]);

        let x = self.hidden.forward(x);
        let x = relu(self.dropout.forward(x));

        self.output.forward(x)
    }

    /// Defines forward pass for training
    ///
    /// Single-label models use categorical cross-entropy, multi-label models binary
    /// cross-entropy. Class weights scale each example's loss by the weight of its class.
    pub fn forward_loss(
        &self,
        tokens: Tensor<B, 2, Int>,
        targets: Tensor<B, 2>,
        class_weight: Option<&[f32]>,
    ) -> Output<B> {
        let output = self.forward(tokens);
        let device = output.device();
        let [batch_size, n_classes] = output.dims();

        let loss = if self.multi_label {
            let probs = sigmoid(output.clone()).clamp(EPSILON, 1.0 - EPSILON);

            let positive = targets.clone() * probs.clone().log();
            let negative =
                targets.clone().neg().add_scalar(1.0) * probs.neg().add_scalar(1.0).log();
            let losses = (positive + negative).neg();

            match class_weight {
                Some(weights) => {
                    let weights = Tensor::<B, 2>::from_floats(
                        Data::new(weights.to_vec(), Shape::new([1, n_classes])),
                        &device,
                    )
                    .repeat(0, batch_size);

                    (losses * weights).mean()
                }
                None => losses.mean(),
            }
        } else {
            match class_weight {
                // Per-example weights scale the one-hot cross-entropy before averaging
                Some(weights) => {
                    let losses = (log_softmax(output.clone(), 1) * targets.clone())
                        .sum_dim(1)
                        .neg();

                    let weights = Tensor::<B, 2>::from_floats(
                        Data::new(weights.to_vec(), Shape::new([n_classes, 1])),
                        &device,
                    );

                    (losses * targets.clone().matmul(weights)).mean()
                }
                None => CrossEntropyLossConfig::new()
                    .init(&device)
                    .forward(output.clone(), targets.clone().argmax(1).reshape([batch_size])),
            }
        };

        Output {
            loss,
            output,
            targets,
        }
    }

    /// Defines forward pass for inference
    pub fn infer(&self, tokens: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let output = self.forward(tokens);

        if self.multi_label {
            sigmoid(output)
        } else {
            softmax(output, 1)
        }
    }
}
