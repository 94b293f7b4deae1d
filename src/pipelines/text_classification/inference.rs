use serde::Serialize;

use crate::{embeddings::Embedding, utils::classes::argmax};

use super::{
    classification::ClassificationModel,
    config::PredictConfig,
    error::ClassificationError,
    generator::pad_tokens,
    labels::{LabelError, Target},
    model::{Architecture, Classifier, Inputs},
};

/// Tokenized input for [`ClassificationModel::predict`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentences<'a> {
    /// A single sentence
    One(&'a [String]),

    /// A list of sentences
    Many(&'a [Vec<String>]),
}

/// Predictions shaped like the [`Sentences`] they were made for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Predictions {
    /// The prediction for a single sentence
    One(Prediction),

    /// One prediction per sentence, in input order
    Many(Vec<Prediction>),
}

/// The prediction for one sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    /// The decided label(s)
    Label(Target),

    /// Every class ranked by score
    Dict(ClassificationResult),
}

/// A class with its raw score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// The class label
    pub name: String,

    /// The model's score for the class
    pub confidence: f32,
}

/// Ranked classes for one sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// The input sentence
    pub words: Vec<String>,

    /// The top-ranked class
    pub class: Candidate,

    /// Every class by descending confidence
    pub class_candidates: Vec<Candidate>,
}

impl<E: Embedding, A: Architecture> ClassificationModel<E, A> {
    /// Tokenize and pad sentences into model inputs
    pub fn inputs(&self, sentences: &[Vec<String>]) -> anyhow::Result<Inputs> {
        let sequence_length = self.embedding.sequence_length();

        let tokenized = self.embedding.tokenize_many(sentences)?;
        let tokens = pad_tokens(&tokenized, sequence_length, self.embedding.pad_token_id());

        let segments = self
            .embedding
            .is_bert()
            .then(|| vec![vec![0; sequence_length]; tokens.len()]);

        Ok(Inputs { tokens, segments })
    }

    /// Predict for one sentence or a list of them, keeping the shape of the input
    pub fn predict(
        &self,
        sentences: Sentences<'_>,
        config: &PredictConfig,
    ) -> anyhow::Result<Predictions> {
        match sentences {
            Sentences::One(sentence) => Ok(Predictions::One(self.predict_one(sentence, config)?)),
            Sentences::Many(sentences) => {
                Ok(Predictions::Many(self.predict_many(sentences, config)?))
            }
        }
    }

    /// Predict for a single sentence
    pub fn predict_one(
        &self,
        sentence: &[String],
        config: &PredictConfig,
    ) -> anyhow::Result<Prediction> {
        self.predict_many(&[sentence.to_vec()], config)?
            .pop()
            .ok_or_else(|| anyhow!("No prediction returned for the sentence"))
    }

    /// Predict for each sentence in a list
    pub fn predict_many(
        &self,
        sentences: &[Vec<String>],
        config: &PredictConfig,
    ) -> anyhow::Result<Vec<Prediction>> {
        let model = self
            .model
            .as_ref()
            .ok_or(ClassificationError::ModelNotBuilt)?;

        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let inputs = self.inputs(sentences)?;
        let scores = model.predict(&inputs, config.batch_size)?;

        if scores.len() != sentences.len() {
            return Err(anyhow!(
                "Expected {} rows of scores, got {}",
                sentences.len(),
                scores.len()
            ));
        }

        if config.debug_info {
            log::info!("input: {:?}", inputs.tokens);
            log::info!("raw output: {:?}", scores);
        }

        if config.output_dict {
            return sentences
                .iter()
                .zip(&scores)
                .map(|(words, scores)| self.format_output_dict(words, scores).map(Prediction::Dict))
                .collect();
        }

        let targets = self.decode_scores(&scores, config.multi_label_threshold)?;

        if config.debug_info {
            log::info!("output: {:?}", targets);
        }

        Ok(targets.into_iter().map(Prediction::Label).collect())
    }

    /// Apply the decision rule to rows of scores
    ///
    /// Single-label models take the arg-max of each row. Multi-label models assign every class
    /// scoring at or above `threshold`.
    pub fn decode_scores(
        &self,
        scores: &[Vec<f32>],
        threshold: f32,
    ) -> anyhow::Result<Vec<Target>> {
        if self.multi_label {
            let binarizer = self
                .multi_label_binarizer
                .as_ref()
                .ok_or(ClassificationError::ModelNotBuilt)?;

            let rows = scores
                .iter()
                .map(|row| row.iter().map(|&score| u8::from(score >= threshold)).collect())
                .collect::<Vec<Vec<u8>>>();

            return Ok(binarizer
                .inverse_transform(&rows)
                .into_iter()
                .map(Target::Multi)
                .collect());
        }

        scores
            .iter()
            .map(|row| {
                let id = argmax(row).ok_or_else(|| anyhow!("Empty score row"))?;
                let label = self.label_index.label(id)?;

                Ok(Target::from(label))
            })
            .collect()
    }

    /// Rank every class for a sentence by descending score
    pub fn format_output_dict(
        &self,
        words: &[String],
        scores: &[f32],
    ) -> anyhow::Result<ClassificationResult> {
        let mut ranked = scores.iter().copied().enumerate().collect::<Vec<_>>();
        ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        let class_candidates = ranked
            .into_iter()
            .map(|(id, confidence)| {
                Ok(Candidate {
                    name: self.label_index.label(id)?.to_string(),
                    confidence,
                })
            })
            .collect::<Result<Vec<_>, LabelError>>()?;

        let class = class_candidates
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("No classes to rank"))?;

        Ok(ClassificationResult {
            words: words.to_vec(),
            class,
            class_candidates,
        })
    }
}
