use std::{fs, path::Path};

use burn::config::Config as _;
use serde::{de::DeserializeOwned, Serialize};

use crate::embeddings::Embedding;

use super::{
    classification::ClassificationModel,
    config::ModelInfo,
    error::ClassificationError,
    labels::{LabelIndex, MultiLabelBinarizer},
    model::{Architecture, Classifier},
};

/// Model metadata: shape, labels and the multi-label flag
pub const MODEL_INFO_FILE: &str = "model.json";

/// The embedding with its vocabulary
pub const EMBEDDING_FILE: &str = "embedding.json";

/// The architecture's hyper-parameters
pub const ARCHITECTURE_FILE: &str = "architecture.json";

/// Framework weights, named without an extension so the recorder can add its own
pub const WEIGHTS_FILE: &str = "weights";

impl<E, A> ClassificationModel<E, A>
where
    E: Embedding + Serialize + DeserializeOwned,
    A: Architecture,
{
    /// Persist the model into a directory
    pub fn save(&self, dir: impl AsRef<Path>) -> anyhow::Result<()> {
        let dir = dir.as_ref();

        let model = self
            .model
            .as_ref()
            .ok_or(ClassificationError::ModelNotBuilt)?;

        fs::create_dir_all(dir)?;

        self.info()
            .save(dir.join(MODEL_INFO_FILE))
            .map_err(|e| anyhow!("Unable to save model info: {}", e))?;

        fs::write(
            dir.join(EMBEDDING_FILE),
            serde_json::to_string_pretty(&self.embedding)?,
        )?;

        self.architecture.save_config(&dir.join(ARCHITECTURE_FILE))?;

        model.save(&dir.join(WEIGHTS_FILE))?;

        log::info!("Model saved to {}", dir.display());

        Ok(())
    }

    /// Restore a model saved with [`save`](Self::save)
    ///
    /// The multi-label binarizer is rebuilt from the restored label index, so predictions use
    /// exactly the classes the model was trained with.
    pub fn load(dir: impl AsRef<Path>, architecture: A) -> anyhow::Result<Self> {
        let dir = dir.as_ref();

        let info = ModelInfo::load(dir.join(MODEL_INFO_FILE))
            .map_err(|e| anyhow!("Unable to load model info: {}", e))?;

        let embedding: E = serde_json::from_str(&fs::read_to_string(dir.join(EMBEDDING_FILE))?)?;

        let label_index = LabelIndex::from(info.labels);

        if label_index.len() != info.shape.num_labels {
            return Err(ClassificationError::IncompatibleModel(format!(
                "{} labels saved for a model with {} outputs",
                label_index.len(),
                info.shape.num_labels
            ))
            .into());
        }

        if embedding.vocab_size() != info.shape.vocab_size {
            return Err(ClassificationError::IncompatibleModel(format!(
                "vocabulary of {} tokens saved for a model built with {}",
                embedding.vocab_size(),
                info.shape.vocab_size
            ))
            .into());
        }

        if embedding.sequence_length() != info.shape.sequence_length {
            return Err(ClassificationError::IncompatibleModel(format!(
                "sequence length {} saved for a model built with {}",
                embedding.sequence_length(),
                info.shape.sequence_length
            ))
            .into());
        }

        let model = architecture.load(&info.shape, &dir.join(WEIGHTS_FILE))?;

        let multi_label_binarizer = info
            .multi_label
            .then(|| MultiLabelBinarizer::new(label_index.clone()));

        log::info!(
            "Loaded a {} model with {} labels from {}",
            if info.multi_label {
                "multi-label"
            } else {
                "single-label"
            },
            label_index.len(),
            dir.display()
        );

        Ok(Self {
            embedding,
            architecture,
            model: Some(model),
            label_index,
            multi_label: info.multi_label,
            multi_label_binarizer,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        embeddings::WordEmbedding,
        pipelines::text_classification::{
            classification::tests::{words, StubArchitecture},
            config::PredictConfig,
            labels::Target,
        },
    };

    use super::*;

    #[test]
    fn test_save_and_load_keep_labels() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let scores = vec![0.2, 0.7, 0.65];

        let mut model = ClassificationModel::new(
            WordEmbedding::new(4, 6),
            StubArchitecture::with_scores(scores.clone()),
            true,
        );

        model.build_token2id_label2id_dict(
            &[words("good plot"), words("bad acting")],
            &[
                Target::from(&["plot", "praise"][..]),
                Target::from(&["acting"][..]),
            ],
            None,
            1,
        )?;
        model.build_model()?;
        model.save(dir.path())?;

        assert!(dir.path().join(MODEL_INFO_FILE).exists());
        assert!(dir.path().join(EMBEDDING_FILE).exists());

        let loaded: ClassificationModel<WordEmbedding, _> =
            ClassificationModel::load(dir.path(), StubArchitecture::with_scores(scores))?;

        assert!(loaded.multi_label());
        assert_eq!(loaded.label_index(), model.label_index());
        assert_eq!(
            loaded.multi_label_binarizer().map(|b| b.classes().to_vec()),
            Some(vec![
                "plot".to_string(),
                "praise".to_string(),
                "acting".to_string()
            ])
        );
        assert_eq!(loaded.embedding().token2idx(), model.embedding().token2idx());

        let sentence = words("good acting");
        let config = PredictConfig::new();
        assert_eq!(
            loaded.predict_one(&sentence, &config)?,
            model.predict_one(&sentence, &config)?
        );

        Ok(())
    }

    #[test]
    fn test_saving_before_build_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let model =
            ClassificationModel::new(WordEmbedding::new(4, 6), StubArchitecture::default(), false);

        let result = model.save(dir.path());

        assert!(matches!(
            result.err().and_then(|e| e.downcast::<ClassificationError>().ok()),
            Some(ClassificationError::ModelNotBuilt)
        ));

        Ok(())
    }
}
