//! Embedding adapters turn word lists into token id sequences for a model

/// Word-level vocabulary embedding with optional pretrained vectors
pub mod word;

/// HuggingFace tokenizer-backed embedding for BERT-style models
pub mod bert;

/// GloVe vector files
pub mod glove;

pub use bert::BertEmbedding;
pub use word::WordEmbedding;

/// The contract a classification pipeline needs from its embedding
pub trait Embedding {
    /// Convert a single tokenized sentence into token ids
    fn tokenize(&self, sentence: &[String]) -> anyhow::Result<Vec<usize>>;

    /// Convert a list of tokenized sentences into token ids
    fn tokenize_many(&self, sentences: &[Vec<String>]) -> anyhow::Result<Vec<Vec<usize>>> {
        sentences
            .iter()
            .map(|sentence| self.tokenize(sentence))
            .collect()
    }

    /// The target sequence length, 0 when not yet set
    fn sequence_length(&self) -> usize;

    /// Set the target sequence length
    fn set_sequence_length(&mut self, sequence_length: usize);

    /// Whether models fed by this embedding also expect an all-zero segment input
    fn is_bert(&self) -> bool {
        false
    }

    /// Populate the vocabulary from a corpus, ignoring tokens seen fewer than `min_count` times
    fn build_token2idx_dict(&mut self, corpus: &[Vec<String>], min_count: usize);

    /// The number of token ids the embedding can produce
    fn vocab_size(&self) -> usize;

    /// The id used to pad sequences
    fn pad_token_id(&self) -> usize {
        0
    }

    /// The width of each embedding vector
    fn embedding_size(&self) -> usize;

    /// A pretrained `[vocab_size * embedding_size]` matrix, if one is available
    fn weights(&self) -> Option<Vec<f32>> {
        None
    }
}
