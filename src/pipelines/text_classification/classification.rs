use std::collections::HashMap;

use crate::embeddings::Embedding;

use super::{
    config::ModelInfo,
    error::ClassificationError,
    labels::{LabelError, LabelIndex, MultiLabelBinarizer, Target},
    model::{Architecture, ModelShape},
};

/// A text classifier wrapping an embedding, a label index and a lazily built framework model
pub struct ClassificationModel<E: Embedding, A: Architecture> {
    /// Converts words to token ids
    pub(crate) embedding: E,

    /// Builds the framework model on first fit
    pub(crate) architecture: A,

    /// The framework model, once built or loaded
    pub(crate) model: Option<A::Model>,

    /// A mapping between class labels and ids
    pub(crate) label_index: LabelIndex,

    /// Whether each example may carry any number of labels
    pub(crate) multi_label: bool,

    /// Multi-hot encoder over the label index, for multi-label models
    pub(crate) multi_label_binarizer: Option<MultiLabelBinarizer>,
}

impl<E: Embedding, A: Architecture> ClassificationModel<E, A> {
    /// Create an untrained classifier
    pub fn new(embedding: E, architecture: A, multi_label: bool) -> Self {
        Self {
            embedding,
            architecture,
            model: None,
            label_index: LabelIndex::default(),
            multi_label,
            multi_label_binarizer: None,
        }
    }

    /// The embedding adapter
    pub fn embedding(&self) -> &E {
        &self.embedding
    }

    /// The embedding adapter, for setting the sequence length before training
    pub fn embedding_mut(&mut self) -> &mut E {
        &mut self.embedding
    }

    /// The framework model, if built
    pub fn model(&self) -> Option<&A::Model> {
        self.model.as_ref()
    }

    /// Whether the framework model has been built or loaded
    pub fn is_built(&self) -> bool {
        self.model.is_some()
    }

    /// Whether the model is multi-label
    pub fn multi_label(&self) -> bool {
        self.multi_label
    }

    /// The label index
    pub fn label_index(&self) -> &LabelIndex {
        &self.label_index
    }

    /// The label to id mapping
    pub fn label2idx(&self) -> &HashMap<String, usize> {
        self.label_index.label2idx()
    }

    /// The multi-hot encoder, for multi-label models
    pub fn multi_label_binarizer(&self) -> Option<&MultiLabelBinarizer> {
        self.multi_label_binarizer.as_ref()
    }

    /// The dimensions of the framework model for the current state
    pub fn shape(&self) -> ModelShape {
        ModelShape::new(
            self.embedding.vocab_size(),
            self.embedding.embedding_size(),
            self.embedding.sequence_length(),
            self.label_index.len(),
            self.multi_label,
            self.embedding.is_bert(),
        )
    }

    /// Summarize the model
    pub fn info(&self) -> ModelInfo {
        ModelInfo::new(
            self.shape(),
            self.label_index.labels().to_vec(),
            self.multi_label,
        )
    }

    /// Build the token vocabulary and the label index from training (and validation) data
    ///
    /// Once the framework model exists its label index is kept, and every label in the data
    /// must already be known to it.
    pub fn build_token2id_label2id_dict(
        &mut self,
        x_train: &[Vec<String>],
        y_train: &[Target],
        validation: Option<(&[Vec<String>], &[Target])>,
        min_count: usize,
    ) -> anyhow::Result<()> {
        let (x_validate, y_validate): (&[Vec<String>], &[Target]) =
            validation.unwrap_or_default();

        let targets = y_train.iter().chain(y_validate);

        let expected = if self.multi_label {
            "multi-label"
        } else {
            "single-label"
        };

        if let Some(target) = targets.clone().find(|t| t.is_multi() != self.multi_label) {
            return Err(LabelError::TargetKind {
                expected,
                found: target.to_string(),
            }
            .into());
        }

        // Labels are settled before the vocabulary, which cannot be rebuilt
        let label_index = if self.is_built() {
            for label in targets.flat_map(Target::labels) {
                self.label_index.id(label)?;
            }

            None
        } else {
            let label_index = LabelIndex::from_targets(targets);

            if label_index.is_empty() {
                return Err(ClassificationError::NoLabels.into());
            }

            Some(label_index)
        };

        let x_data = x_train
            .iter()
            .chain(x_validate)
            .cloned()
            .collect::<Vec<_>>();

        self.embedding.build_token2idx_dict(&x_data, min_count);

        if let Some(label_index) = label_index {
            self.multi_label_binarizer = self
                .multi_label
                .then(|| MultiLabelBinarizer::new(label_index.clone()));
            self.label_index = label_index;
        }

        Ok(())
    }

    /// Build the framework model for the current shape
    pub fn build_model(&mut self) -> anyhow::Result<()> {
        let model = self
            .architecture
            .build(&self.shape(), self.embedding.weights())?;

        self.model = Some(model);

        Ok(())
    }

    /// Convert a label to its id
    pub fn convert_label_to_idx(&self, label: &str) -> Result<usize, LabelError> {
        self.label_index.id(label)
    }

    /// Convert a list of labels to their ids
    pub fn convert_labels_to_idx(&self, labels: &[&str]) -> Result<Vec<usize>, LabelError> {
        self.label_index.ids(labels.iter().copied())
    }

    /// Convert an id to its label
    pub fn convert_idx_to_label(&self, id: usize) -> Result<&str, LabelError> {
        self.label_index.label(id)
    }

    /// Convert a list of ids to their labels
    pub fn convert_idx_to_labels(&self, ids: &[usize]) -> Result<Vec<String>, LabelError> {
        self.label_index.labels_for(ids)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{cell::RefCell, path::Path, rc::Rc};

    use pretty_assertions::assert_eq;

    use crate::{
        embeddings::WordEmbedding,
        pipelines::text_classification::{
            generator::Batches,
            model::{Classifier, Inputs, Validation},
        },
    };

    use super::*;

    /// What a stub classifier was asked to do
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Calls {
        pub shape: Option<ModelShape>,
        pub batch_sizes: Vec<usize>,
        pub steps_per_epoch: usize,
        pub epochs: usize,
        pub validation_steps: Option<usize>,
        pub class_weight: Option<Vec<f32>>,
    }

    /// A classifier returning fixed scores and recording its training calls
    pub struct StubClassifier {
        pub scores: Vec<f32>,
        pub calls: Rc<RefCell<Calls>>,
    }

    impl Classifier for StubClassifier {
        fn fit_generator(
            &mut self,
            train: &mut Batches<'_>,
            steps_per_epoch: usize,
            epochs: usize,
            validation: Option<Validation<'_>>,
            class_weight: Option<&[f32]>,
        ) -> anyhow::Result<()> {
            let mut calls = self.calls.borrow_mut();

            for _ in 0..steps_per_epoch * epochs {
                let batch = train.next().ok_or_else(|| anyhow!("exhausted"))??;
                calls.batch_sizes.push(batch.len());
            }

            calls.steps_per_epoch = steps_per_epoch;
            calls.epochs = epochs;
            calls.validation_steps = validation.map(|v| v.steps);
            calls.class_weight = class_weight.map(<[f32]>::to_vec);

            Ok(())
        }

        fn predict(
            &self,
            inputs: &Inputs,
            _batch_size: Option<usize>,
        ) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![self.scores.clone(); inputs.len()])
        }

        fn save(&self, _path: &Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Builds stub classifiers sharing one call log
    #[derive(Default)]
    pub struct StubArchitecture {
        pub scores: Vec<f32>,
        pub calls: Rc<RefCell<Calls>>,
    }

    impl StubArchitecture {
        pub fn with_scores(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: Rc::default(),
            }
        }
    }

    impl Architecture for StubArchitecture {
        type Model = StubClassifier;

        fn build(
            &self,
            shape: &ModelShape,
            _weights: Option<Vec<f32>>,
        ) -> anyhow::Result<StubClassifier> {
            self.calls.borrow_mut().shape = Some(shape.clone());

            Ok(StubClassifier {
                scores: self.scores.clone(),
                calls: self.calls.clone(),
            })
        }

        fn load(&self, shape: &ModelShape, _path: &Path) -> anyhow::Result<StubClassifier> {
            self.build(shape, None)
        }

        fn save_config(&self, _path: &Path) -> anyhow::Result<()> {
            Ok(())
        }
    }

    pub fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_label_index_follows_first_seen_order() -> anyhow::Result<()> {
        let mut model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), false);

        let x = vec![words("good film"), words("bad film"), words("fine")];
        let y = vec![Target::from("pos"), Target::from("neg"), Target::from("pos")];
        let x_val = vec![words("meh")];
        let y_val = vec![Target::from("neutral")];

        model.build_token2id_label2id_dict(&x, &y, Some((&x_val, &y_val)), 1)?;

        assert_eq!(model.label_index().labels(), ["pos", "neg", "neutral"]);
        assert_eq!(model.convert_label_to_idx("neg")?, 1);
        assert_eq!(model.convert_labels_to_idx(&["neutral", "pos"])?, vec![2, 0]);
        assert_eq!(model.convert_idx_to_label(2)?, "neutral");
        assert_eq!(model.convert_idx_to_labels(&[1, 0])?, vec!["neg", "pos"]);
        assert!(model.multi_label_binarizer().is_none());

        Ok(())
    }

    #[test]
    fn test_multi_label_builds_binarizer() -> anyhow::Result<()> {
        let mut model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), true);

        let x = vec![words("a b"), words("c")];
        let y = vec![Target::from(&["x", "y"][..]), Target::from(&["z"][..])];

        model.build_token2id_label2id_dict(&x, &y, None, 1)?;

        let binarizer = model
            .multi_label_binarizer()
            .ok_or_else(|| anyhow!("missing binarizer"))?;

        assert_eq!(binarizer.classes(), ["x", "y", "z"]);

        Ok(())
    }

    #[test]
    fn test_target_kind_must_match_model() {
        let mut model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), false);

        let result = model.build_token2id_label2id_dict(
            &[words("a")],
            &[Target::from(&["x"][..])],
            None,
            1,
        );

        assert!(matches!(
            result.err().and_then(|e| e.downcast::<LabelError>().ok()),
            Some(LabelError::TargetKind { .. })
        ));
    }

    #[test]
    fn test_rejected_targets_leave_the_vocabulary_unbuilt() -> anyhow::Result<()> {
        let mut model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), false);

        let rejected = model.build_token2id_label2id_dict(
            &[words("some other words")],
            &[Target::from(&["x"][..])],
            None,
            1,
        );

        assert!(rejected.is_err());
        assert_eq!(model.embedding().vocab_size(), 0);
        assert!(model.label_index().is_empty());

        model.build_token2id_label2id_dict(
            &[words("good film"), words("bad film")],
            &[Target::from("pos"), Target::from("neg")],
            None,
            1,
        )?;

        let ids = model.embedding().tokenize(&words("good bad film"))?;

        assert!(ids.iter().all(|&id| id > 1));
        assert_eq!(model.label_index().labels(), ["pos", "neg"]);

        Ok(())
    }

    #[test]
    fn test_built_model_rejects_new_labels() -> anyhow::Result<()> {
        let mut model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), false);

        model.build_token2id_label2id_dict(&[words("a")], &[Target::from("x")], None, 1)?;
        model.build_model()?;

        let result =
            model.build_token2id_label2id_dict(&[words("b")], &[Target::from("y")], None, 1);

        assert!(matches!(
            result.err().and_then(|e| e.downcast::<LabelError>().ok()),
            Some(LabelError::UnknownLabel(label)) if label == "y"
        ));

        Ok(())
    }
}
