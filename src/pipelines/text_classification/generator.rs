use derive_new::new;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    embeddings::Embedding,
    utils::sequences::{pad_sequences, Padding, Truncating},
};

use super::{
    error::ClassificationError,
    labels::{encode_targets, LabelIndex, MultiLabelBinarizer, Target},
};

/// A page of padded token ids with their encoded targets
#[derive(Debug, Clone, PartialEq, new)]
pub struct Batch {
    /// Token ids padded to the sequence length: `[batch_size][sequence_length]`
    pub tokens: Vec<Vec<usize>>,

    /// All-zero segment ids of the same shape, for embeddings that need them
    pub segments: Option<Vec<Vec<usize>>>,

    /// One-hot (single-label) or multi-hot (multi-label) targets: `[batch_size][num_labels]`
    pub targets: Vec<Vec<u8>>,
}

impl Batch {
    /// The number of examples in the batch
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the batch holds no examples
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A stream of batches pulled by a training loop
pub type Batches<'a> = dyn Iterator<Item = anyhow::Result<Batch>> + 'a;

/// Pad tokenized sentences the way every model input is padded
pub fn pad_tokens(
    tokens: &[Vec<usize>],
    sequence_length: usize,
    pad_token_id: usize,
) -> Vec<Vec<usize>> {
    pad_sequences(
        tokens,
        sequence_length,
        pad_token_id,
        Padding::Post,
        Truncating::Pre,
    )
}

/// An endless generator of fixed-size batches over parallel input and label arrays
///
/// Every pass over the data shuffles the order of pages (batch-sized contiguous slices), not
/// the examples inside them. A trailing partial page wraps around to the start of the data so
/// that every batch holds exactly `batch_size` examples.
pub struct BatchGenerator<'a, E: Embedding> {
    embedding: &'a E,
    labels: &'a LabelIndex,
    binarizer: Option<&'a MultiLabelBinarizer>,
    inputs: &'a [Vec<String>],
    targets: &'a [Target],
    batch_size: usize,
    pages: Vec<usize>,
    rng: StdRng,
}

impl<'a, E: Embedding> BatchGenerator<'a, E> {
    /// Creates a new generator, seeded for reproducible page order when a seed is given
    pub fn new(
        embedding: &'a E,
        labels: &'a LabelIndex,
        binarizer: Option<&'a MultiLabelBinarizer>,
        inputs: &'a [Vec<String>],
        targets: &'a [Target],
        batch_size: usize,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        if inputs.len() != targets.len() {
            return Err(ClassificationError::LengthMismatch {
                inputs: inputs.len(),
                labels: targets.len(),
            }
            .into());
        }

        if inputs.is_empty() {
            return Err(ClassificationError::EmptyDataset.into());
        }

        if batch_size == 0 {
            return Err(ClassificationError::InvalidBatchSize.into());
        }

        if embedding.sequence_length() == 0 {
            return Err(ClassificationError::SequenceLengthUnset.into());
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            embedding,
            labels,
            binarizer,
            inputs,
            targets,
            batch_size,
            pages: Vec::new(),
            rng,
        })
    }

    /// The number of pages in one pass over the data
    pub fn num_pages(&self) -> usize {
        self.inputs.len().div_ceil(self.batch_size)
    }

    /// Build the batch for a page
    pub fn page(&self, page: usize) -> anyhow::Result<Batch> {
        let len = self.inputs.len();
        let start = page * self.batch_size;

        let indices = (start..start + self.batch_size).map(|i| i % len);

        let (inputs, targets): (Vec<_>, Vec<_>) = indices
            .map(|i| (self.inputs[i].clone(), self.targets[i].clone()))
            .unzip();

        let sequence_length = self.embedding.sequence_length();

        let tokenized = self.embedding.tokenize_many(&inputs)?;
        let tokens = pad_tokens(&tokenized, sequence_length, self.embedding.pad_token_id());

        let segments = self
            .embedding
            .is_bert()
            .then(|| vec![vec![0; sequence_length]; tokens.len()]);

        let targets = encode_targets(self.labels, self.binarizer, &targets)?;

        Ok(Batch {
            tokens,
            segments,
            targets,
        })
    }
}

impl<'a, E: Embedding> Iterator for BatchGenerator<'a, E> {
    type Item = anyhow::Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pages.is_empty() {
            self.pages = (0..self.num_pages()).collect();
            self.pages.shuffle(&mut self.rng);
        }

        let page = self.pages.pop()?;

        Some(self.page(page))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::embeddings::{BertEmbedding, WordEmbedding};

    use super::*;

    fn sentences(n: usize) -> Vec<Vec<String>> {
        (0..n)
            .map(|i| (0..=(i % 7)).map(|j| format!("w{}", i + j)).collect())
            .collect()
    }

    fn targets(n: usize) -> Vec<Target> {
        (0..n)
            .map(|i| Target::from(if i % 2 == 0 { "even" } else { "odd" }))
            .collect()
    }

    fn embedding(inputs: &[Vec<String>], sequence_length: usize) -> WordEmbedding {
        let mut embedding = WordEmbedding::new(4, sequence_length);
        embedding.build_token2idx_dict(inputs, 1);
        embedding
    }

    #[test]
    fn test_partial_page_wraps_around() -> anyhow::Result<()> {
        let inputs = sentences(5);
        let targets = targets(5);
        let embedding = embedding(&inputs, 3);
        let labels = LabelIndex::from_targets(&targets);

        let generator =
            BatchGenerator::new(&embedding, &labels, None, &inputs, &targets, 2, Some(7))?;

        assert_eq!(generator.num_pages(), 3);

        // Page 2 holds example 4 then wraps to example 0
        let batch = generator.page(2)?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.targets, vec![vec![1, 0], vec![1, 0]]);
        let w0 = embedding.tokenize(&inputs[0])?[0];
        assert_eq!(batch.tokens[1], vec![w0, 0, 0]);

        Ok(())
    }

    #[test]
    fn test_each_pass_visits_every_page() -> anyhow::Result<()> {
        let inputs = sentences(6);
        let targets = targets(6);
        let embedding = embedding(&inputs, 8);
        let labels = LabelIndex::from_targets(&targets);

        let generator =
            BatchGenerator::new(&embedding, &labels, None, &inputs, &targets, 2, Some(1))?;

        let first_tokens = |batch: &Batch| batch.tokens[0].clone();
        let expected = (0..3)
            .map(|page| generator.page(page).map(|batch| first_tokens(&batch)))
            .collect::<anyhow::Result<BTreeSet<_>>>()?;

        let seen = generator
            .take(3)
            .map(|batch| batch.map(|batch| first_tokens(&batch)))
            .collect::<anyhow::Result<BTreeSet<_>>>()?;

        assert_eq!(seen, expected);

        Ok(())
    }

    #[test]
    fn test_generator_is_endless() -> anyhow::Result<()> {
        let inputs = sentences(3);
        let targets = targets(3);
        let embedding = embedding(&inputs, 4);
        let labels = LabelIndex::from_targets(&targets);

        let generator =
            BatchGenerator::new(&embedding, &labels, None, &inputs, &targets, 3, None)?;

        assert_eq!(generator.take(10).count(), 10);

        Ok(())
    }

    #[test]
    fn test_multi_label_targets_are_multi_hot() -> anyhow::Result<()> {
        let inputs = sentences(2);
        let targets = vec![
            Target::from(&["a", "b"][..]),
            Target::from(&["c"][..]),
        ];
        let embedding = embedding(&inputs, 4);
        let labels = LabelIndex::from_targets(&targets);
        let binarizer = MultiLabelBinarizer::new(labels.clone());

        let generator = BatchGenerator::new(
            &embedding,
            &labels,
            Some(&binarizer),
            &inputs,
            &targets,
            2,
            Some(3),
        )?;

        let batch = generator.page(0)?;

        assert_eq!(batch.targets, vec![vec![1, 1, 0], vec![0, 0, 1]]);

        Ok(())
    }

    #[test]
    fn test_bert_embeddings_get_segments() -> anyhow::Result<()> {
        use std::str::FromStr;

        let tokenizer = tokenizers::Tokenizer::from_str(
            r#"{"version":"1.0","truncation":null,"padding":null,"added_tokens":[],
            "normalizer":null,"pre_tokenizer":null,"post_processor":null,"decoder":null,
            "model":{"type":"WordLevel","vocab":{"[PAD]":0,"[UNK]":1},"unk_token":"[UNK]"}}"#,
        )
        .map_err(|e| anyhow!("{}", e))?;
        let embedding = BertEmbedding::new(tokenizer, 8, 5);

        let inputs = sentences(2);
        let targets = targets(2);
        let labels = LabelIndex::from_targets(&targets);

        let generator =
            BatchGenerator::new(&embedding, &labels, None, &inputs, &targets, 2, Some(3))?;

        let batch = generator.page(0)?;

        assert_eq!(batch.segments, Some(vec![vec![0; 5]; 2]));

        Ok(())
    }

    #[test]
    fn test_mismatched_lengths_are_rejected() {
        let inputs = sentences(3);
        let targets = targets(2);
        let embedding = embedding(&inputs, 4);
        let labels = LabelIndex::from_targets(&targets);

        let result = BatchGenerator::new(&embedding, &labels, None, &inputs, &targets, 2, None);

        assert!(matches!(
            result.err().and_then(|e| e.downcast::<ClassificationError>().ok()),
            Some(ClassificationError::LengthMismatch { inputs: 3, labels: 2 })
        ));
    }

    proptest! {
        #[test]
        fn prop_batches_have_fixed_shape(
            n in 1usize..40,
            batch_size in 1usize..16,
            sequence_length in 1usize..12,
        ) {
            let batch_size = batch_size.min(n);
            let inputs = sentences(n);
            let targets = targets(n);
            let embedding = embedding(&inputs, sequence_length);
            let labels = LabelIndex::from_targets(&targets);

            let generator = BatchGenerator::new(
                &embedding, &labels, None, &inputs, &targets, batch_size, Some(0),
            ).unwrap();

            for batch in generator.take(2 * n / batch_size + 2) {
                let batch = batch.unwrap();
                prop_assert_eq!(batch.len(), batch_size);
                prop_assert_eq!(batch.targets.len(), batch_size);
                prop_assert!(batch.tokens.iter().all(|row| row.len() == sequence_length));
            }
        }
    }
}
