use crate::{embeddings::Embedding, utils::sequences::quantile_length};

use super::{
    classification::ClassificationModel,
    config::TrainingConfig,
    error::ClassificationError,
    generator::BatchGenerator,
    labels::{LabelIndex, Target},
    model::{Architecture, Classifier, Validation},
};

/// The quantile of training sentence lengths used when no sequence length is configured
pub const SEQUENCE_LENGTH_QUANTILE: f64 = 0.95;

/// Halve the batch size when it exceeds the number of examples, never going below 1
pub fn effective_batch_size(num_examples: usize, batch_size: usize) -> usize {
    if num_examples < batch_size {
        (num_examples / 2).max(1)
    } else {
        batch_size
    }
}

/// Balanced class weights, `n_samples / (n_present_classes * count)` per class id
///
/// Every label occurrence counts as one sample, so multi-label targets contribute once per
/// label. Classes that never occur get a weight of 1.
pub fn balanced_class_weights(
    index: &LabelIndex,
    targets: &[Target],
) -> anyhow::Result<Vec<f32>> {
    let mut counts = vec![0usize; index.len()];

    for label in targets.iter().flat_map(Target::labels) {
        counts[index.id(label)?] += 1;
    }

    let samples: usize = counts.iter().sum();
    let present = counts.iter().filter(|&&count| count > 0).count();

    Ok(counts
        .into_iter()
        .map(|count| {
            if count == 0 {
                1.0
            } else {
                samples as f32 / (present * count) as f32
            }
        })
        .collect())
}

impl<E: Embedding, A: Architecture> ClassificationModel<E, A> {
    /// Train on parallel input and label arrays, with optional validation data
    ///
    /// Builds the vocabulary and label index, infers an unset sequence length from the
    /// training sentences, builds the framework model on first use and drives its fit loop.
    pub fn fit(
        &mut self,
        x_train: &[Vec<String>],
        y_train: &[Target],
        validation: Option<(&[Vec<String>], &[Target])>,
        config: &TrainingConfig,
    ) -> anyhow::Result<()> {
        if x_train.len() != y_train.len() {
            return Err(ClassificationError::LengthMismatch {
                inputs: x_train.len(),
                labels: y_train.len(),
            }
            .into());
        }

        if let Some((x_validate, y_validate)) = validation {
            if x_validate.len() != y_validate.len() {
                return Err(ClassificationError::LengthMismatch {
                    inputs: x_validate.len(),
                    labels: y_validate.len(),
                }
                .into());
            }
        }

        if x_train.is_empty() {
            return Err(ClassificationError::EmptyDataset.into());
        }

        if config.batch_size == 0 {
            return Err(ClassificationError::InvalidBatchSize.into());
        }

        self.build_token2id_label2id_dict(x_train, y_train, validation, config.min_count)?;

        let batch_size = effective_batch_size(x_train.len(), config.batch_size);
        if batch_size != config.batch_size {
            log::warn!(
                "Batch size {} exceeds the {} training examples, using {}",
                config.batch_size,
                x_train.len(),
                batch_size
            );
        }

        if !self.is_built() {
            let inferred = self.embedding.sequence_length() == 0;

            if inferred {
                let sequence_length =
                    quantile_length(x_train.iter().map(Vec::len), SEQUENCE_LENGTH_QUANTILE)
                        .unwrap_or(0)
                        .max(1);

                self.embedding.set_sequence_length(sequence_length);

                log::info!("sequence length set to {}", sequence_length);
            }

            if let Err(error) = self.build_model() {
                // Infer again on the next fit
                if inferred {
                    self.embedding.set_sequence_length(0);
                }

                return Err(error);
            }
        }

        let class_weight = if config.class_weight {
            Some(balanced_class_weights(&self.label_index, y_train)?)
        } else {
            None
        };

        let binarizer = self.multi_label_binarizer.as_ref();

        let mut train_generator = BatchGenerator::new(
            &self.embedding,
            &self.label_index,
            binarizer,
            x_train,
            y_train,
            batch_size,
            config.seed,
        )?;

        let mut validation_generator = match validation {
            Some((x_validate, y_validate)) if !x_validate.is_empty() => Some((
                BatchGenerator::new(
                    &self.embedding,
                    &self.label_index,
                    binarizer,
                    x_validate,
                    y_validate,
                    batch_size,
                    config.seed,
                )?,
                (x_validate.len() / batch_size).max(1),
            )),
            _ => None,
        };

        let steps_per_epoch = x_train.len() / batch_size;

        log::info!(
            "Training on {} examples for {} epochs ({} steps per epoch, batch size {})",
            x_train.len(),
            config.epochs,
            steps_per_epoch,
            batch_size
        );

        let model = self
            .model
            .as_mut()
            .ok_or(ClassificationError::ModelNotBuilt)?;

        model.fit_generator(
            &mut train_generator,
            steps_per_epoch,
            config.epochs,
            validation_generator
                .as_mut()
                .map(|(generator, steps)| Validation {
                    batches: generator,
                    steps: *steps,
                }),
            class_weight.as_deref(),
        )
    }
}
