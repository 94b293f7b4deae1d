//! Command line tool for inference with a trained text classifier

use std::path::Path;

use anyhow::{anyhow, Result};
use burn_text_classification::{
    backend::{device, Backend},
    embeddings::WordEmbedding,
    models::cnn::CnnArchitecture,
    pipelines::text_classification::{
        persistence::ARCHITECTURE_FILE, ClassificationModel, PredictConfig, Sentences,
    },
    utils::text::text_to_word_sequence,
};
use pico_args::Arguments;

const HELP: &str = "\
Usage: infer ARTIFACT_DIR SENTENCE... [OPTIONS]

Arguments:
  ARTIFACT_DIR         The directory a model was saved to by 'train'
  SENTENCE             One or more sentences to classify

Options:
  -h, --help           Print help
  --dict               Print every class ranked by confidence
  --threshold          Score at or above which a multi-label class is assigned (defaults to 0.6)
  --debug              Log inputs, raw scores and decisions
";

#[derive(Debug)]
struct Args {
    /// Prints the usage menu
    help: bool,

    /// Print ranked candidates
    dict: bool,

    /// Multi-label threshold
    threshold: Option<f32>,

    /// Log model inputs and scores
    debug: bool,

    /// The saved model
    artifact_dir: String,

    /// The sentences to classify
    sentences: Vec<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut pargs = Arguments::from_env();

    let help = pargs.contains(["-h", "--help"]);
    let dict = pargs.contains("--dict");
    let debug = pargs.contains("--debug");
    let threshold = pargs.opt_value_from_str("--threshold")?;

    if help {
        return Ok(Args {
            help,
            dict,
            threshold,
            debug,
            artifact_dir: String::new(),
            sentences: Vec::new(),
        });
    }

    let artifact_dir = pargs.free_from_str()?;

    let sentences = pargs
        .finish()
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    Ok(Args {
        help,
        dict,
        threshold,
        debug,
        artifact_dir,
        sentences,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = parse_args()?;

    if args.help {
        println!("{}", HELP);
        return Ok(());
    }

    if args.sentences.is_empty() {
        return Err(anyhow!("Missing required argument: SENTENCE"));
    }

    let artifact_dir = Path::new(&args.artifact_dir);

    let architecture =
        CnnArchitecture::<Backend>::from_file(artifact_dir.join(ARCHITECTURE_FILE), device())?;

    let model =
        ClassificationModel::<WordEmbedding, _>::load(artifact_dir, architecture)?;

    let sentences = args
        .sentences
        .iter()
        .map(|sentence| text_to_word_sequence(sentence))
        .collect::<Vec<_>>();

    let mut config = PredictConfig::new()
        .with_output_dict(args.dict)
        .with_debug_info(args.debug);

    if let Some(threshold) = args.threshold {
        config.multi_label_threshold = threshold;
    }

    let predictions = model.predict(Sentences::Many(&sentences), &config)?;

    println!("{}", serde_json::to_string_pretty(&predictions)?);

    Ok(())
}
