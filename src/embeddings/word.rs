use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Embedding;

/// The padding token
pub static PAD: &str = "<PAD>";

/// The token substituted for words outside the vocabulary
pub static UNK: &str = "<UNK>";

/// The beginning-of-sequence token
pub static BOS: &str = "<BOS>";

/// The end-of-sequence token
pub static EOS: &str = "<EOS>";

/// A word-level embedding whose vocabulary is built from the training corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEmbedding {
    /// A mapping from tokens to ids, empty until the vocabulary is built
    token2idx: HashMap<String, usize>,

    /// Tokens in id order
    idx2token: Vec<String>,

    /// Target sequence length, 0 when unset
    sequence_length: usize,

    /// Width of each embedding vector
    embedding_size: usize,

    /// Pretrained vectors used to seed the embedding matrix
    #[serde(skip)]
    vectors: Option<HashMap<String, Vec<f32>>>,
}

impl WordEmbedding {
    /// Create an embedding with randomly initialised vectors of the given width
    pub fn new(embedding_size: usize, sequence_length: usize) -> Self {
        Self {
            token2idx: HashMap::new(),
            idx2token: Vec::new(),
            sequence_length,
            embedding_size,
            vectors: None,
        }
    }

    /// Create an embedding seeded from pretrained vectors, such as GloVe
    pub fn with_vectors(
        vectors: HashMap<String, Vec<f32>>,
        sequence_length: usize,
    ) -> anyhow::Result<Self> {
        let embedding_size = vectors
            .values()
            .next()
            .map(Vec::len)
            .ok_or_else(|| anyhow!("Pretrained vectors are empty"))?;

        if let Some((word, _)) = vectors.iter().find(|(_, v)| v.len() != embedding_size) {
            return Err(anyhow!(
                "Pretrained vector for '{}' does not have {} dimensions",
                word,
                embedding_size
            ));
        }

        Ok(Self {
            vectors: Some(vectors),
            ..Self::new(embedding_size, sequence_length)
        })
    }

    /// The token to id mapping
    pub fn token2idx(&self) -> &HashMap<String, usize> {
        &self.token2idx
    }

    /// Look up the token for an id
    pub fn idx2token(&self, id: usize) -> Option<&str> {
        self.idx2token.get(id).map(String::as_str)
    }

    fn push_token(&mut self, token: &str) {
        if !self.token2idx.contains_key(token) {
            self.token2idx.insert(token.to_string(), self.idx2token.len());
            self.idx2token.push(token.to_string());
        }
    }
}

impl Embedding for WordEmbedding {
    fn tokenize(&self, sentence: &[String]) -> anyhow::Result<Vec<usize>> {
        if self.token2idx.is_empty() {
            return Err(anyhow!("The vocabulary has not been built"));
        }

        let unk = self.token2idx[UNK];

        Ok(sentence
            .iter()
            .map(|token| self.token2idx.get(token).copied().unwrap_or(unk))
            .collect())
    }

    fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    fn set_sequence_length(&mut self, sequence_length: usize) {
        self.sequence_length = sequence_length;
    }

    fn build_token2idx_dict(&mut self, corpus: &[Vec<String>], min_count: usize) {
        if !self.token2idx.is_empty() {
            return;
        }

        // Counts kept in first-seen order so that equal counts keep a stable order
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(&str, usize)> = Vec::new();

        for token in corpus.iter().flatten() {
            match seen.get(token.as_str()) {
                Some(&position) => counts[position].1 += 1,
                None => {
                    seen.insert(token.as_str(), counts.len());
                    counts.push((token, 1));
                }
            }
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1));

        for special in [PAD, UNK, BOS, EOS] {
            self.push_token(special);
        }

        for (token, count) in counts {
            if count >= min_count {
                self.push_token(token);
            }
        }

        log::info!("Vocabulary built with {} tokens", self.idx2token.len());
    }

    fn vocab_size(&self) -> usize {
        self.idx2token.len()
    }

    fn embedding_size(&self) -> usize {
        self.embedding_size
    }

    fn weights(&self) -> Option<Vec<f32>> {
        let vectors = self.vectors.as_ref()?;

        let mut matrix = vec![0.0; self.idx2token.len() * self.embedding_size];
        let mut found = 0usize;

        for (id, token) in self.idx2token.iter().enumerate() {
            // Tokens without a pretrained vector keep an all-zero row
            if let Some(vector) = vectors.get(token) {
                let start = id * self.embedding_size;
                matrix[start..start + self.embedding_size].copy_from_slice(vector);
                found += 1;
            }
        }

        log::info!(
            "Pretrained vectors found for {} of {} tokens",
            found,
            self.idx2token.len()
        );

        Some(matrix)
    }
}
