//! Command line tool to train the CNN sentiment classifier on the movie review polarity corpus

use burn_text_classification::{
    backend::{device, Backend},
    sentiment::{self, SentimentConfig},
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: sentiment [OPTIONS]

Options:
  -h, --help           Print help
  --positive           Data source for the positive data
  --negative           Data source for the negative data
  --glove              GloVe vectors file
  --dev-sample         Percentage of the training data to use for validation (defaults to 0.1)
  --embedding-dims     Dimensionality of the word vectors (defaults to 100)
  --filters            Number of convolution filters (defaults to 250)
  --kernel-size        Convolution window size (defaults to 3)
  --hidden-dims        Width of the hidden layer (defaults to 250)
  -n, --num-epochs     Number of epochs to train for (defaults to 5)
  -b, --batch-size     Batch size (defaults to 64)
  --seed               Seed for the dev split (defaults to 10)
  -a, --artifact-dir   Where to save the trained model
";

fn parse_args() -> anyhow::Result<Option<SentimentConfig>> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let mut config = SentimentConfig::new();

    if let Some(positive) = pargs.opt_value_from_str("--positive")? {
        config.positive_data_file = positive;
    }

    if let Some(negative) = pargs.opt_value_from_str("--negative")? {
        config.negative_data_file = negative;
    }

    if let Some(glove) = pargs.opt_value_from_str("--glove")? {
        config.glove_file = glove;
    }

    if let Some(dev_sample) = pargs.opt_value_from_str("--dev-sample")? {
        config.dev_sample_percentage = dev_sample;
    }

    if let Some(embedding_dims) = pargs.opt_value_from_str("--embedding-dims")? {
        config.embedding_dims = embedding_dims;
    }

    if let Some(filters) = pargs.opt_value_from_str("--filters")? {
        config.filters = filters;
    }

    if let Some(kernel_size) = pargs.opt_value_from_str("--kernel-size")? {
        config.kernel_size = kernel_size;
    }

    if let Some(hidden_dims) = pargs.opt_value_from_str("--hidden-dims")? {
        config.hidden_dims = hidden_dims;
    }

    if let Some(num_epochs) = pargs.opt_value_from_str(["-n", "--num-epochs"])? {
        config.epochs = num_epochs;
    }

    if let Some(batch_size) = pargs.opt_value_from_str(["-b", "--batch-size"])? {
        config.batch_size = batch_size;
    }

    if let Some(seed) = pargs.opt_value_from_str("--seed")? {
        config.seed = seed;
    }

    if let Some(artifact_dir) = pargs.opt_value_from_str(["-a", "--artifact-dir"])? {
        config.artifact_dir = artifact_dir;
    }

    Ok(Some(config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let config = match parse_args()? {
        Some(config) => config,
        None => {
            print!("{}", HELP);
            return Ok(());
        }
    };

    log::info!("Parameters:\n{}", config);

    sentiment::run::<Backend>(config, device()).await?;

    Ok(())
}
