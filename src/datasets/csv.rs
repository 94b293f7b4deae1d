use std::path::Path;

use burn::data::dataset::{self, Dataset as _, InMemDataset};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::{pipelines::text_classification::Target, utils::text::text_to_word_sequence};

use super::DatasetError;

/// The default separator between labels of a multi-label row
pub const DEFAULT_SEPARATOR: char = '|';

/// A labelled text row
#[derive(Clone, Debug, Serialize, Deserialize, new)]
pub struct Item {
    /// The text for classification
    pub text: String,

    /// The class label, or separated class labels for multi-label rows
    pub label: String,
}

/// Struct for a CSV dataset with `text,label` columns
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Item>,
}

/// Implement the Dataset trait for the CSV dataset
impl dataset::Dataset<Item> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Item> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

impl Dataset {
    /// Reads a CSV file with a `text,label` header
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let reader = ::csv::ReaderBuilder::new();

        let dataset: InMemDataset<Item> = InMemDataset::from_csv(path, &reader)?;

        Ok(Self { dataset })
    }

    /// Tokenize every row into words and parse its label(s)
    ///
    /// Multi-label rows split their label on `separator`, trimming each label and dropping empty
    /// ones. Rows without words, or single-label rows without a label, are rejected.
    pub fn to_arrays(
        &self,
        multi_label: bool,
        separator: char,
    ) -> Result<(Vec<Vec<String>>, Vec<Target>), DatasetError> {
        let mut x = Vec::with_capacity(self.len());
        let mut y = Vec::with_capacity(self.len());

        for (row, item) in self.iter().enumerate() {
            let words = text_to_word_sequence(&item.text);

            if words.is_empty() {
                return Err(DatasetError::MalformedRow {
                    row,
                    reason: "no words in text".to_string(),
                });
            }

            let target = if multi_label {
                Target::Multi(
                    item.label
                        .split(separator)
                        .map(str::trim)
                        .filter(|label| !label.is_empty())
                        .map(str::to_string)
                        .collect(),
                )
            } else {
                let label = item.label.trim();

                if label.is_empty() {
                    return Err(DatasetError::MalformedRow {
                        row,
                        reason: "missing label".to_string(),
                    });
                }

                Target::from(label)
            };

            x.push(words);
            y.push(target);
        }

        Ok((x, y))
    }
}
