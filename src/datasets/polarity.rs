use std::path::Path;

use crate::{
    pipelines::text_classification::Target,
    utils::{files::read_file, text::text_to_word_sequence},
};

use super::DatasetError;

/// The label of sentences from the positive corpus
pub static POSITIVE: &str = "positive";

/// The label of sentences from the negative corpus
pub static NEGATIVE: &str = "negative";

/// Load positive and negative corpora, one sentence per line, as tokenized sentences with labels
///
/// Positive sentences come first. Blank lines are skipped.
pub async fn load(
    positive: impl AsRef<Path>,
    negative: impl AsRef<Path>,
) -> anyhow::Result<(Vec<Vec<String>>, Vec<Target>)> {
    let positive = load_sentences(positive.as_ref()).await?;
    log::info!("Positive sentences: {}", positive.len());

    let negative = load_sentences(negative.as_ref()).await?;
    log::info!("Negative sentences: {}", negative.len());

    let y = std::iter::repeat(Target::from(POSITIVE))
        .take(positive.len())
        .chain(std::iter::repeat(Target::from(NEGATIVE)).take(negative.len()))
        .collect::<Vec<_>>();

    let x = positive.into_iter().chain(negative).collect::<Vec<_>>();

    log::info!("Total sentences: {}", x.len());

    Ok((x, y))
}

async fn load_sentences(path: &Path) -> anyhow::Result<Vec<Vec<String>>> {
    let sentences = read_file(path)
        .await
        .map_err(|e| anyhow!("Unable to read {}: {}", path.display(), e))?
        .iter()
        .map(|line| text_to_word_sequence(line))
        .filter(|words| !words.is_empty())
        .collect::<Vec<_>>();

    if sentences.is_empty() {
        return Err(DatasetError::Empty(path.display().to_string()).into());
    }

    Ok(sentences)
}
