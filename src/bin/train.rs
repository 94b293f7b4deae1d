//! Command line tool to train a text classifier on a CSV dataset

use anyhow::anyhow;
use burn_text_classification::{
    backend::{device, Backend},
    datasets::{csv, train_test_split},
    embeddings::{glove, WordEmbedding},
    models::cnn::{self, CnnArchitecture},
    pipelines::text_classification::{
        ClassificationModel, EvaluateConfig, Target, TrainingConfig,
    },
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: train DATASET [OPTIONS]

Arguments:
  DATASET              A CSV file with 'text' and 'label' columns

Options:
  -h, --help           Print help
  -t, --test           A CSV file to evaluate on (defaults to a split of DATASET)
  --test-size          Fraction of DATASET held out when there is no test file (defaults to 0.1)
  -a, --artifact-dir   Where to save the trained model (defaults to 'data/model')
  --multi-label        Treat labels as lists of classes
  --separator          Separator between the classes of a multi-label row (defaults to '|')
  -n, --num-epochs     Number of epochs to train for
  -b, --batch-size     Batch size
  --class-weight       Weight classes inversely to their frequency
  --min-count          Minimum number of occurrences for a word to enter the vocabulary
  --glove              A GloVe vectors file to initialise the embedding with
  --embedding-size     Width of randomly initialised word vectors (defaults to 100)
  --sequence-length    Padded sentence length (defaults to the 95th percentile)
  --seed               Seed for the split and batch shuffling
";

/// The width of word vectors when no pretrained vectors are given
const DEFAULT_EMBEDDING_SIZE: usize = 100;

#[derive(Debug)]
struct Args {
    dataset: String,
    test: Option<String>,
    test_size: f64,
    artifact_dir: String,
    multi_label: bool,
    separator: char,
    num_epochs: Option<usize>,
    batch_size: Option<usize>,
    class_weight: bool,
    min_count: Option<usize>,
    glove: Option<String>,
    embedding_size: usize,
    sequence_length: usize,
    seed: Option<u64>,
}

impl Args {
    fn parse() -> anyhow::Result<Option<Self>> {
        let mut pargs = Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let args = Args {
            test: pargs.opt_value_from_str(["-t", "--test"])?,
            test_size: pargs.opt_value_from_str("--test-size")?.unwrap_or(0.1),
            artifact_dir: pargs
                .opt_value_from_str(["-a", "--artifact-dir"])?
                .unwrap_or_else(|| "data/model".to_string()),
            multi_label: pargs.contains("--multi-label"),
            separator: pargs
                .opt_value_from_str("--separator")?
                .unwrap_or(csv::DEFAULT_SEPARATOR),
            num_epochs: pargs.opt_value_from_str(["-n", "--num-epochs"])?,
            batch_size: pargs.opt_value_from_str(["-b", "--batch-size"])?,
            class_weight: pargs.contains("--class-weight"),
            min_count: pargs.opt_value_from_str("--min-count")?,
            glove: pargs.opt_value_from_str("--glove")?,
            embedding_size: pargs
                .opt_value_from_str("--embedding-size")?
                .unwrap_or(DEFAULT_EMBEDDING_SIZE),
            sequence_length: pargs.opt_value_from_str("--sequence-length")?.unwrap_or(0),
            seed: pargs.opt_value_from_str("--seed")?,
            dataset: pargs.free_from_str().map_err(|e| match e {
                pico_args::Error::MissingArgument => anyhow!("Missing required argument: DATASET"),
                _ => anyhow!("{}", e),
            })?,
        };

        Ok(Some(args))
    }
}

type Split = (Vec<Vec<String>>, Vec<Vec<String>>, Vec<Target>, Vec<Target>);

async fn load_data(args: &Args) -> anyhow::Result<Split> {
    let dataset = csv::Dataset::load(&args.dataset)
        .await
        .map_err(|e| anyhow!("Unable to read {}: {}", args.dataset, e))?;
    let (x, y) = dataset.to_arrays(args.multi_label, args.separator)?;

    match &args.test {
        Some(test) => {
            let test = csv::Dataset::load(test)
                .await
                .map_err(|e| anyhow!("Unable to read {}: {}", test, e))?;
            let (x_test, y_test) = test.to_arrays(args.multi_label, args.separator)?;

            Ok((x, x_test, y, y_test))
        }
        None => Ok(train_test_split(&x, &y, args.test_size, args.seed)?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = match Args::parse()? {
        Some(args) => args,
        None => {
            print!("{}", HELP);
            return Ok(());
        }
    };

    let (x_train, x_test, y_train, y_test) = load_data(&args).await?;

    log::info!("Train/Test split: {}/{}", x_train.len(), x_test.len());

    let embedding = match &args.glove {
        Some(path) => WordEmbedding::with_vectors(glove::load(path).await?, args.sequence_length)?,
        None => WordEmbedding::new(args.embedding_size, args.sequence_length),
    };

    let architecture = CnnArchitecture::<Backend>::new(cnn::Config::new(), device());

    let mut model = ClassificationModel::new(embedding, architecture, args.multi_label);

    let mut training = TrainingConfig::new()
        .with_class_weight(args.class_weight)
        .with_seed(args.seed);

    if let Some(num_epochs) = args.num_epochs {
        training.epochs = num_epochs;
    }

    if let Some(batch_size) = args.batch_size {
        training.batch_size = batch_size;
    }

    if let Some(min_count) = args.min_count {
        training.min_count = min_count;
    }

    model.fit(&x_train, &y_train, Some((&x_test, &y_test)), &training)?;

    model.evaluate(
        &x_test,
        &y_test,
        &EvaluateConfig::new().with_batch_size(args.batch_size),
    )?;

    model.save(&args.artifact_dir)?;

    log::info!("Saved the trained model to {}", args.artifact_dir);

    Ok(())
}
