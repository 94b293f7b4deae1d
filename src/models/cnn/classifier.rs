use std::path::Path;

use burn::{
    config::Config as _,
    data::dataloader::batcher::Batcher as _,
    module::{AutodiffModule, Module},
    optim::{AdamConfig, GradientsParams, Optimizer},
    record::{CompactRecorder, Recorder},
    tensor::{
        activation::{sigmoid, softmax},
        backend::{AutodiffBackend, Backend},
        ElementConversion, Tensor,
    },
};

use crate::{
    pipelines::text_classification::{
        generator::Batches,
        model::{Architecture, Classifier, Inputs, ModelShape, Validation},
        Batch,
    },
    utils::{classes::argmax, tensors::to_rows},
};

use super::{batcher::Batcher, Config, Infer, Model, Train};

/// Rows per forward pass when predicting without an explicit batch size
pub const DEFAULT_PREDICT_BATCH_SIZE: usize = 32;

/// Running loss and accuracy over a number of batches
#[derive(Debug, Default, Clone, Copy)]
struct Metrics {
    loss: f64,
    correct: usize,
    total: usize,
    batches: usize,
}

impl Metrics {
    fn update(
        &mut self,
        loss: f64,
        scores: Vec<Vec<f32>>,
        targets: Vec<Vec<f32>>,
        multi_label: bool,
    ) {
        self.loss += loss;
        self.batches += 1;

        for (row, target) in scores.iter().zip(&targets) {
            if multi_label {
                // Binary accuracy over every class
                self.correct += row
                    .iter()
                    .zip(target)
                    .filter(|&(&score, &flag)| (score >= 0.5) == (flag > 0.5))
                    .count();
                self.total += row.len();
            } else {
                let predicted = argmax(row);
                let expected = argmax(target);

                if predicted.is_some() && predicted == expected {
                    self.correct += 1;
                }
                self.total += 1;
            }
        }
    }

    fn loss(&self) -> f64 {
        if self.batches == 0 {
            f64::NAN
        } else {
            self.loss / self.batches as f64
        }
    }

    fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Pull the next batch from a generator that should never run dry
fn next_batch(batches: &mut Batches<'_>) -> anyhow::Result<Batch> {
    batches
        .next()
        .ok_or_else(|| anyhow!("The batch generator was exhausted"))?
}

/// Scores of a model for target rows, as probabilities on the host
fn scores<B: Backend>(model: &Model<B>, output: Tensor<B, 2>) -> Vec<Vec<f32>> {
    if model.multi_label {
        to_rows(sigmoid(output))
    } else {
        to_rows(softmax(output, 1))
    }
}

/// A trained or trainable convolutional classifier on an autodiff backend
#[derive(Debug)]
pub struct CnnClassifier<B: AutodiffBackend> {
    model: Model<B>,
    config: Config,
    device: B::Device,
}

impl<B: AutodiffBackend> CnnClassifier<B> {
    /// Wrap a model with the hyper-parameters it is trained with
    pub fn new(model: Model<B>, config: Config, device: B::Device) -> Self {
        Self {
            model,
            config,
            device,
        }
    }

    /// The underlying Burn module
    pub fn model(&self) -> &Model<B> {
        &self.model
    }

    fn validate(&self, validation: Validation<'_>) -> anyhow::Result<Metrics> {
        let model = self.model.valid();
        let batcher = Batcher::<B::InnerBackend>::new(self.device.clone());

        let mut metrics = Metrics::default();

        for _ in 0..validation.steps {
            let batch = next_batch(&mut *validation.batches)?;

            let item: Train<B::InnerBackend> = batcher.batch(vec![batch]);
            let output = model.forward_loss(item.tokens, item.targets, None);

            let loss = output.loss.into_scalar().elem::<f64>();
            metrics.update(
                loss,
                scores(&model, output.output),
                to_rows(output.targets),
                model.multi_label,
            );
        }

        Ok(metrics)
    }
}

impl<B: AutodiffBackend> Classifier for CnnClassifier<B> {
    fn fit_generator(
        &mut self,
        train: &mut Batches<'_>,
        steps_per_epoch: usize,
        epochs: usize,
        mut validation: Option<Validation<'_>>,
        class_weight: Option<&[f32]>,
    ) -> anyhow::Result<()> {
        let batcher = Batcher::<B>::new(self.device.clone());

        // Initialize optimizer
        let mut optim = AdamConfig::new()
            .with_epsilon(self.config.adam_epsilon)
            .init::<B, Model<B>>();

        let mut model = self.model.clone();

        for epoch in 1..=epochs {
            let mut metrics = Metrics::default();

            for _ in 0..steps_per_epoch {
                let batch = next_batch(train)?;

                let item: Train<B> = batcher.batch(vec![batch]);
                let output = model.forward_loss(item.tokens, item.targets, class_weight);

                let loss = output.loss.clone().into_scalar().elem::<f64>();
                metrics.update(
                    loss,
                    scores(&model, output.output.detach()),
                    to_rows(output.targets),
                    model.multi_label,
                );

                // Backward pass + Adam update
                let grads = GradientsParams::from_grads(output.loss.backward(), &model);
                model = optim.step(self.config.learning_rate, model, grads);
            }

            self.model = model.clone();

            match validation.as_mut() {
                Some(validation) => {
                    let valid = self.validate(Validation {
                        batches: &mut *validation.batches,
                        steps: validation.steps,
                    })?;

                    log::info!(
                        "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
                        epoch,
                        epochs,
                        metrics.loss(),
                        metrics.accuracy(),
                        valid.loss(),
                        valid.accuracy()
                    );
                }
                None => {
                    log::info!(
                        "Epoch {}/{} - loss: {:.4} - accuracy: {:.4}",
                        epoch,
                        epochs,
                        metrics.loss(),
                        metrics.accuracy()
                    );
                }
            }
        }

        self.model = model;

        Ok(())
    }

    fn predict(
        &self,
        inputs: &Inputs,
        batch_size: Option<usize>,
    ) -> anyhow::Result<Vec<Vec<f32>>> {
        let batch_size = batch_size.unwrap_or(DEFAULT_PREDICT_BATCH_SIZE).max(1);

        let model = self.model.valid();
        let batcher = Batcher::<B::InnerBackend>::new(self.device.clone());

        let mut scores = Vec::with_capacity(inputs.len());

        for chunk in inputs.tokens.chunks(batch_size) {
            let item: Infer<B::InnerBackend> = batcher.batch(chunk.to_vec());

            scores.extend(to_rows(model.infer(item.tokens)));
        }

        Ok(scores)
    }

    fn save(&self, path: &Path) -> anyhow::Result<()> {
        CompactRecorder::new()
            .record(self.model.clone().into_record(), path.to_path_buf())
            .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))
    }
}

/// Builds and restores [`CnnClassifier`]s on a device
#[derive(Debug, Clone)]
pub struct CnnArchitecture<B: AutodiffBackend> {
    config: Config,
    device: B::Device,
}

impl<B: AutodiffBackend> CnnArchitecture<B> {
    /// Creates a new architecture
    pub fn new(config: Config, device: B::Device) -> Self {
        Self { config, device }
    }

    /// Load the hyper-parameters saved with [`Architecture::save_config`]
    pub fn from_file(path: impl AsRef<Path>, device: B::Device) -> anyhow::Result<Self> {
        let config = Config::load(path.as_ref())
            .map_err(|e| anyhow!("Unable to load config file: {}", e))?;

        Ok(Self::new(config, device))
    }

    /// The hyper-parameters
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<B: AutodiffBackend> Architecture for CnnArchitecture<B> {
    type Model = CnnClassifier<B>;

    fn build(
        &self,
        shape: &ModelShape,
        weights: Option<Vec<f32>>,
    ) -> anyhow::Result<Self::Model> {
        if shape.is_bert {
            log::warn!("Segment inputs are ignored by the convolutional classifier");
        }

        let model = self.config.init::<B>(shape, weights, &self.device)?;

        log::info!(
            "Built a convolutional classifier: vocabulary {}, embedding {}, sequence length {}, {} classes",
            shape.vocab_size,
            shape.embedding_size,
            shape.sequence_length,
            shape.num_labels
        );

        Ok(CnnClassifier::new(
            model,
            self.config.clone(),
            self.device.clone(),
        ))
    }

    fn load(&self, shape: &ModelShape, path: &Path) -> anyhow::Result<Self::Model> {
        let record = CompactRecorder::new()
            .load(path.to_path_buf(), &self.device)
            .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

        let model = self
            .config
            .init::<B>(shape, None, &self.device)?
            .load_record(record);

        Ok(CnnClassifier::new(
            model,
            self.config.clone(),
            self.device.clone(),
        ))
    }

    fn save_config(&self, path: &Path) -> anyhow::Result<()> {
        self.config
            .save(path)
            .map_err(|e| anyhow!("Unable to save config file: {}", e))
    }
}
