use rand::{rngs::StdRng, seq::index, SeedableRng};

use crate::embeddings::Embedding;

use super::{
    classification::ClassificationModel,
    config::{EvaluateConfig, PredictConfig},
    error::ClassificationError,
    inference::Prediction,
    labels::Target,
    model::Architecture,
    report::ClassificationReport,
};

/// The number of examples logged when debug info is requested
const DEBUG_SAMPLES: usize = 5;

impl<E: Embedding, A: Architecture> ClassificationModel<E, A> {
    /// Predict a held-out set, print its classification report and return it
    pub fn evaluate(
        &self,
        x_data: &[Vec<String>],
        y_data: &[Target],
        config: &EvaluateConfig,
    ) -> anyhow::Result<ClassificationReport> {
        if x_data.len() != y_data.len() {
            return Err(ClassificationError::LengthMismatch {
                inputs: x_data.len(),
                labels: y_data.len(),
            }
            .into());
        }

        if x_data.is_empty() {
            return Err(ClassificationError::EmptyDataset.into());
        }

        let predict_config = PredictConfig::new()
            .with_batch_size(config.batch_size)
            .with_multi_label_threshold(config.multi_label_threshold);

        let y_pred = self
            .predict_many(x_data, &predict_config)?
            .into_iter()
            .map(|prediction| match prediction {
                Prediction::Label(target) => Ok(target),
                Prediction::Dict(_) => Err(anyhow!("Expected a label prediction")),
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let report = ClassificationReport::new(y_data, &y_pred)?;

        println!("{}", report.render(config.digits));

        if config.debug_info {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let amount = DEBUG_SAMPLES.min(x_data.len());

            for i in index::sample(&mut rng, x_data.len(), amount) {
                log::debug!("------ sample {} ------", i);
                log::debug!("x      : {:?}", x_data[i]);
                log::debug!("y      : {}", y_data[i]);
                log::debug!("y_pred : {}", y_pred[i]);
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::{
        embeddings::WordEmbedding,
        pipelines::text_classification::classification::tests::{words, StubArchitecture},
    };

    use super::*;

    #[test]
    fn test_evaluate_returns_the_report() -> anyhow::Result<()> {
        let mut model = ClassificationModel::new(
            WordEmbedding::new(4, 5),
            StubArchitecture::with_scores(vec![0.9, 0.1]),
            false,
        );

        let x = vec![words("good film"), words("bad film")];
        let y = vec![Target::from("pos"), Target::from("neg")];

        model.build_token2id_label2id_dict(&x, &y, None, 1)?;
        model.build_model()?;

        let report = model.evaluate(
            &x,
            &y,
            &EvaluateConfig::new().with_debug_info(true).with_seed(Some(5)),
        )?;

        // The stub always scores "pos" highest
        assert_eq!(report.accuracy, Some(0.5));
        assert_eq!(report.examples, 2);
        assert_eq!(report.labels.len(), 2);

        Ok(())
    }

    #[test]
    fn test_evaluate_rejects_an_empty_set() {
        let model =
            ClassificationModel::new(WordEmbedding::new(4, 5), StubArchitecture::default(), false);

        let result = model.evaluate(&[], &[], &EvaluateConfig::new());

        assert!(matches!(
            result.err().and_then(|e| e.downcast::<ClassificationError>().ok()),
            Some(ClassificationError::EmptyDataset)
        ));
    }
}
