use std::path::Path;

use serde::{Deserialize, Serialize};
use tokenizers::{EncodeInput, InputSequence, Tokenizer};

use super::Embedding;

/// The padding token used by BERT vocabularies
pub static PAD: &str = "[PAD]";

/// An embedding backed by a HuggingFace tokenizer with a fixed vocabulary
///
/// Models fed by this embedding receive an all-zero segment input next to the token ids.
#[derive(Clone, Serialize, Deserialize)]
pub struct BertEmbedding {
    /// The underlying tokenizer
    tokenizer: Tokenizer,

    /// Target sequence length, 0 when unset
    sequence_length: usize,

    /// Width of the hidden state (e.g., 768 for bert-base-uncased)
    embedding_size: usize,
}

impl BertEmbedding {
    /// Wrap an existing tokenizer
    pub fn new(tokenizer: Tokenizer, embedding_size: usize, sequence_length: usize) -> Self {
        Self {
            tokenizer,
            sequence_length,
            embedding_size,
        }
    }

    /// Load a `tokenizer.json` file
    pub fn from_file(
        path: impl AsRef<Path>,
        embedding_size: usize,
        sequence_length: usize,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Unable to load tokenizer {}: {}", path.display(), e))?;

        Ok(Self::new(tokenizer, embedding_size, sequence_length))
    }
}

impl Embedding for BertEmbedding {
    fn tokenize(&self, sentence: &[String]) -> anyhow::Result<Vec<usize>> {
        let input = EncodeInput::Single(InputSequence::from(sentence.to_vec()));

        let encoding = self
            .tokenizer
            .encode(input, true)
            .map_err(|e| anyhow!("Unable to encode {:?}: {}", sentence, e))?;

        Ok(encoding.get_ids().iter().map(|id| *id as usize).collect())
    }

    fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    fn set_sequence_length(&mut self, sequence_length: usize) {
        self.sequence_length = sequence_length;
    }

    fn is_bert(&self) -> bool {
        true
    }

    fn build_token2idx_dict(&mut self, _corpus: &[Vec<String>], _min_count: usize) {
        // The pretrained vocabulary is fixed
    }

    fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    fn pad_token_id(&self) -> usize {
        self.tokenizer
            .token_to_id(PAD)
            .map(|id| id as usize)
            .unwrap_or(0)
    }

    fn embedding_size(&self) -> usize {
        self.embedding_size
    }
}
