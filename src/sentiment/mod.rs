//! Binary sentiment classification of movie review sentences with a convolutional network over
//! GloVe word vectors

use std::path::Path;

use burn::{config::Config as _, tensor::backend::AutodiffBackend};

use crate::{
    datasets::{polarity, train_test_split},
    embeddings::{glove, Embedding as _, WordEmbedding},
    models::cnn::{self, CnnArchitecture},
    pipelines::text_classification::{
        ClassificationModel, ClassificationReport, EvaluateConfig, Target, TrainingConfig,
    },
};

/// The file the run configuration is saved to, next to the trained model
pub static CONFIG_FILE: &str = "sentiment.json";

/// Sentiment run configuration
#[derive(burn::config::Config, Debug)]
pub struct SentimentConfig {
    /// Percentage of the training data to use for validation
    #[config(default = 0.1)]
    pub dev_sample_percentage: f64,

    /// Data source for the positive data
    #[config(default = "\"data/rt-polaritydata/rt-polarity.pos\".to_string()")]
    pub positive_data_file: String,

    /// Data source for the negative data
    #[config(default = "\"data/rt-polaritydata/rt-polarity.neg\".to_string()")]
    pub negative_data_file: String,

    /// GloVe vectors file
    #[config(default = "\"data/glove.6B/glove.6B.100d.txt\".to_string()")]
    pub glove_file: String,

    /// Dimensionality of the word vectors
    #[config(default = 100)]
    pub embedding_dims: usize,

    /// Number of convolution filters
    #[config(default = 250)]
    pub filters: usize,

    /// Convolution window size
    #[config(default = 3)]
    pub kernel_size: usize,

    /// Width of the hidden layer
    #[config(default = 250)]
    pub hidden_dims: usize,

    /// Number of training epochs
    #[config(default = 5)]
    pub epochs: usize,

    /// Batch size
    #[config(default = 64)]
    pub batch_size: usize,

    /// Seed for the dev split and page shuffling
    #[config(default = 10)]
    pub seed: u64,

    /// Where the trained model is saved
    #[config(default = "\"data/sentiment/model\".to_string()")]
    pub artifact_dir: String,
}

/// Tokenized sentences split into train and dev parts
#[derive(Debug, Clone)]
pub struct SentimentDataset {
    /// Training sentences
    pub x_train: Vec<Vec<String>>,

    /// Training labels
    pub y_train: Vec<Target>,

    /// Dev sentences
    pub x_dev: Vec<Vec<String>>,

    /// Dev labels
    pub y_dev: Vec<Target>,
}

impl SentimentDataset {
    /// The number of words in the longest sentence of either split
    pub fn max_sentence_length(&self) -> usize {
        self.x_train
            .iter()
            .chain(&self.x_dev)
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }
}

/// Load the polarity corpus and split it into train and dev parts
pub async fn construct_dataset(config: &SentimentConfig) -> anyhow::Result<SentimentDataset> {
    let (x, y) = polarity::load(&config.positive_data_file, &config.negative_data_file).await?;

    let (x_train, x_dev, y_train, y_dev) =
        train_test_split(&x, &y, config.dev_sample_percentage, Some(config.seed))?;

    log::info!("Train/Dev split: {}/{}", x_train.len(), x_dev.len());

    Ok(SentimentDataset {
        x_train,
        y_train,
        x_dev,
        y_dev,
    })
}

/// Train a sentiment classifier, report on the dev split and save it to `artifact_dir`
pub async fn run<B: AutodiffBackend>(
    config: SentimentConfig,
    device: B::Device,
) -> anyhow::Result<ClassificationReport> {
    let dataset = construct_dataset(&config).await?;

    let vectors = glove::load(&config.glove_file).await?;
    let embedding = WordEmbedding::with_vectors(vectors, dataset.max_sentence_length())?;

    if embedding.embedding_size() != config.embedding_dims {
        return Err(anyhow!(
            "Expected {}-dimensional word vectors in {}, found {}",
            config.embedding_dims,
            config.glove_file,
            embedding.embedding_size()
        ));
    }

    let architecture = CnnArchitecture::<B>::new(
        cnn::Config::new()
            .with_filters(config.filters)
            .with_kernel_size(config.kernel_size)
            .with_hidden_dims(config.hidden_dims),
        device,
    );

    let mut model = ClassificationModel::new(embedding, architecture, false);

    model.fit(
        &dataset.x_train,
        &dataset.y_train,
        Some((&dataset.x_dev, &dataset.y_dev)),
        &TrainingConfig::new()
            .with_batch_size(config.batch_size)
            .with_epochs(config.epochs)
            .with_min_count(1)
            .with_seed(Some(config.seed)),
    )?;

    let report = model.evaluate(&dataset.x_dev, &dataset.y_dev, &EvaluateConfig::new())?;

    let artifact_dir = Path::new(&config.artifact_dir);
    model.save(artifact_dir)?;

    config
        .save(artifact_dir.join(CONFIG_FILE))
        .map_err(|e| anyhow!("Unable to save sentiment config: {}", e))?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use burn::backend::{Autodiff, NdArray};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::embeddings::Embedding as _;

    fn lines(lines: &[&str]) -> anyhow::Result<tempfile::NamedTempFile> {
        let mut file = tempfile::NamedTempFile::new()?;
        for line in lines {
            writeln!(file, "{}", line)?;
        }

        Ok(file)
    }

    struct Corpus {
        positive: tempfile::NamedTempFile,
        negative: tempfile::NamedTempFile,
        glove: tempfile::NamedTempFile,
    }

    fn corpus() -> anyhow::Result<Corpus> {
        Ok(Corpus {
            positive: lines(&[
                "a wonderful warm film",
                "great acting and a great story",
                "truly wonderful",
                "a great film",
                "warm and funny",
            ])?,
            negative: lines(&[
                "a dull boring film",
                "terrible acting and a dull story",
                "truly boring",
                "a terrible film",
                "cold and flat",
            ])?,
            glove: lines(&[
                "wonderful 1.0 0.5 0.0 0.1",
                "great 0.9 0.4 0.1 0.0",
                "dull -1.0 -0.5 0.0 0.1",
                "terrible -0.9 -0.4 0.1 0.0",
                "film 0.0 0.0 1.0 0.0",
            ])?,
        })
    }

    fn config(corpus: &Corpus, artifact_dir: &Path) -> SentimentConfig {
        SentimentConfig::new()
            .with_positive_data_file(corpus.positive.path().display().to_string())
            .with_negative_data_file(corpus.negative.path().display().to_string())
            .with_glove_file(corpus.glove.path().display().to_string())
            .with_artifact_dir(artifact_dir.display().to_string())
            .with_dev_sample_percentage(0.2)
            .with_embedding_dims(4)
            .with_filters(4)
            .with_kernel_size(2)
            .with_hidden_dims(3)
            .with_epochs(1)
    }

    #[tokio::test]
    async fn test_construct_dataset_splits_both_corpora() -> anyhow::Result<()> {
        let corpus = corpus()?;
        let dir = tempfile::tempdir()?;

        let dataset = construct_dataset(&config(&corpus, dir.path())).await?;

        assert_eq!(dataset.x_dev.len(), 2);
        assert_eq!(dataset.x_train.len(), 8);
        assert_eq!(dataset.y_train.len(), 8);
        assert_eq!(dataset.max_sentence_length(), 6);

        Ok(())
    }

    #[tokio::test]
    async fn test_run_trains_reports_and_saves() -> anyhow::Result<()> {
        let corpus = corpus()?;
        let dir = tempfile::tempdir()?;

        let report = run::<Autodiff<NdArray>>(config(&corpus, dir.path()), Default::default()).await?;

        assert_eq!(report.examples, 2);
        assert!(dir.path().join(CONFIG_FILE).exists());

        let restored = ClassificationModel::<WordEmbedding, CnnArchitecture<Autodiff<NdArray>>>::load(
            dir.path(),
            CnnArchitecture::new(
                cnn::Config::new()
                    .with_filters(4)
                    .with_kernel_size(2)
                    .with_hidden_dims(3),
                Default::default(),
            ),
        )?;

        assert_eq!(restored.embedding().sequence_length(), 6);
        assert_eq!(restored.embedding().embedding_size(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_vector_width_must_match() -> anyhow::Result<()> {
        let corpus = corpus()?;
        let dir = tempfile::tempdir()?;

        let result = run::<Autodiff<NdArray>>(
            config(&corpus, dir.path()).with_embedding_dims(100),
            Default::default(),
        )
        .await;

        assert!(result.is_err());
        assert!(!dir.path().join(CONFIG_FILE).exists());

        Ok(())
    }
}
