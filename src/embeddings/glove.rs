use std::{collections::HashMap, path::Path};

use crate::utils::files::file_reader;

/// Load a GloVe text file (`word v1 v2 ...` per line) into a word to vector map
///
/// The first well-formed line fixes the vector dimension; later lines with a different
/// dimension or unparsable values are skipped.
pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<HashMap<String, Vec<f32>>> {
    let path = path.as_ref();
    let mut lines = file_reader(path)
        .await
        .map_err(|e| anyhow!("Unable to open vector file {}: {}", path.display(), e))?;

    let mut vectors = HashMap::new();
    let mut dims = None;
    let mut skipped = 0usize;

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line, dims) {
            Some((word, vector)) => {
                dims.get_or_insert(vector.len());
                vectors.insert(word, vector);
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed lines in {}", skipped, path.display());
    }

    log::info!("Found {} word vectors.", vectors.len());

    Ok(vectors)
}

fn parse_line(line: &str, dims: Option<usize>) -> Option<(String, Vec<f32>)> {
    let mut values = line.split_whitespace();
    let word = values.next()?.to_string();

    let vector = values
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    match dims {
        _ if vector.is_empty() => None,
        Some(dims) if dims != vector.len() => None,
        _ => Some((word, vector)),
    }
}
