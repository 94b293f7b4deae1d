use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::utils::classes::invert_map;

/// The label(s) attached to a single example
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    /// Exactly one class (single-label classification)
    Single(String),

    /// Zero or more classes (multi-label classification)
    Multi(Vec<String>),
}

impl Target {
    /// Iterate over every label carried by the target
    pub fn labels(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Target::Single(label) => Box::new(std::iter::once(label.as_str())),
            Target::Multi(labels) => Box::new(labels.iter().map(String::as_str)),
        }
    }

    /// Whether this is a multi-label target
    pub fn is_multi(&self) -> bool {
        matches!(self, Target::Multi(_))
    }
}

impl From<&str> for Target {
    fn from(label: &str) -> Self {
        Target::Single(label.to_string())
    }
}

impl From<String> for Target {
    fn from(label: String) -> Self {
        Target::Single(label)
    }
}

impl From<Vec<String>> for Target {
    fn from(labels: Vec<String>) -> Self {
        Target::Multi(labels)
    }
}

impl From<&[&str]> for Target {
    fn from(labels: &[&str]) -> Self {
        Target::Multi(labels.iter().map(|label| label.to_string()).collect())
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Single(label) => write!(f, "{}", label),
            Target::Multi(labels) => write!(f, "({})", labels.join(", ")),
        }
    }
}

/// Label Error
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// The label is not part of the index
    #[error("unknown label {0}")]
    UnknownLabel(String),

    /// The id is outside the index
    #[error("unknown label id {0}")]
    UnknownId(usize),

    /// A single-label target was given to a multi-label model or vice versa
    #[error("expected a {expected} target, found {found}")]
    TargetKind {
        /// The kind of target the model expects
        expected: &'static str,
        /// The offending target
        found: String,
    },
}

/// A bidirectional mapping between label names and dense ids in `[0, len)`
///
/// Ids follow first-seen order. The inverse mapping is derived once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelIndex {
    /// A mapping from class name labels to class ids
    label2idx: HashMap<String, usize>,

    /// Class name labels in id order
    idx2label: Vec<String>,
}

impl LabelIndex {
    /// Build an index from labels, keeping the first occurrence of each
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut idx2label: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for label in labels {
            let label = label.as_ref();
            if seen.insert(label.to_string()) {
                idx2label.push(label.to_string());
            }
        }

        let label2idx = invert_map(idx2label.iter().cloned().enumerate());

        Self {
            label2idx,
            idx2label,
        }
    }

    /// Build an index over every label found in the targets
    pub fn from_targets<'a, I>(targets: I) -> Self
    where
        I: IntoIterator<Item = &'a Target>,
    {
        Self::from_labels(targets.into_iter().flat_map(Target::labels))
    }

    /// The number of labels
    pub fn len(&self) -> usize {
        self.idx2label.len()
    }

    /// Whether the index holds no labels
    pub fn is_empty(&self) -> bool {
        self.idx2label.is_empty()
    }

    /// Labels in id order
    pub fn labels(&self) -> &[String] {
        &self.idx2label
    }

    /// The label to id mapping
    pub fn label2idx(&self) -> &HashMap<String, usize> {
        &self.label2idx
    }

    /// Whether the label is known
    pub fn contains(&self, label: &str) -> bool {
        self.label2idx.contains_key(label)
    }

    /// Look up the id for a label
    pub fn id(&self, label: &str) -> Result<usize, LabelError> {
        self.label2idx
            .get(label)
            .copied()
            .ok_or_else(|| LabelError::UnknownLabel(label.to_string()))
    }

    /// Look up the label for an id
    pub fn label(&self, id: usize) -> Result<&str, LabelError> {
        self.idx2label
            .get(id)
            .map(String::as_str)
            .ok_or(LabelError::UnknownId(id))
    }

    /// Look up the ids for a list of labels
    pub fn ids<'a, I>(&self, labels: I) -> Result<Vec<usize>, LabelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels.into_iter().map(|label| self.id(label)).collect()
    }

    /// Look up the labels for a list of ids
    pub fn labels_for(&self, ids: &[usize]) -> Result<Vec<String>, LabelError> {
        ids.iter()
            .map(|&id| self.label(id).map(str::to_string))
            .collect()
    }
}

impl From<Vec<String>> for LabelIndex {
    fn from(labels: Vec<String>) -> Self {
        Self::from_labels(labels)
    }
}

impl From<LabelIndex> for Vec<String> {
    fn from(index: LabelIndex) -> Self {
        index.idx2label
    }
}

/// Converts label tuples to and from fixed-width multi-hot vectors over known classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiLabelBinarizer {
    classes: LabelIndex,
}

impl MultiLabelBinarizer {
    /// Create a binarizer whose columns follow the index's id order
    pub fn new(classes: LabelIndex) -> Self {
        Self { classes }
    }

    /// The known classes
    pub fn classes(&self) -> &[String] {
        self.classes.labels()
    }

    /// Encode one label tuple as a multi-hot vector
    pub fn transform_one<'a, I>(&self, labels: I) -> Result<Vec<u8>, LabelError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut row = vec![0; self.classes.len()];

        for label in labels {
            row[self.classes.id(label)?] = 1;
        }

        Ok(row)
    }

    /// Encode label tuples as multi-hot rows
    pub fn transform(&self, targets: &[Vec<String>]) -> Result<Vec<Vec<u8>>, LabelError> {
        targets
            .iter()
            .map(|labels| self.transform_one(labels.iter().map(String::as_str)))
            .collect()
    }

    /// Decode multi-hot rows back to label tuples in class order
    pub fn inverse_transform(&self, rows: &[Vec<u8>]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(self.classes.labels())
                    .filter(|&(&flag, _)| flag != 0)
                    .map(|(_, label)| label.clone())
                    .collect()
            })
            .collect()
    }
}

/// Convert class ids to one-hot rows
pub fn to_categorical(ids: &[usize], num_classes: usize) -> Vec<Vec<u8>> {
    ids.iter()
        .map(|&id| {
            let mut row = vec![0; num_classes];
            row[id] = 1;
            row
        })
        .collect()
}

/// Encode targets as one-hot rows, or as multi-hot rows when a binarizer is given
pub fn encode_targets(
    index: &LabelIndex,
    binarizer: Option<&MultiLabelBinarizer>,
    targets: &[Target],
) -> Result<Vec<Vec<u8>>, LabelError> {
    match binarizer {
        Some(binarizer) => targets
            .iter()
            .map(|target| match target {
                Target::Multi(labels) => binarizer.transform_one(labels.iter().map(String::as_str)),
                Target::Single(_) => Err(LabelError::TargetKind {
                    expected: "multi-label",
                    found: target.to_string(),
                }),
            })
            .collect(),
        None => {
            let ids = targets
                .iter()
                .map(|target| match target {
                    Target::Single(label) => index.id(label),
                    Target::Multi(_) => Err(LabelError::TargetKind {
                        expected: "single-label",
                        found: target.to_string(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(to_categorical(&ids, index.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn multi(labels: &[&str]) -> Target {
        Target::from(labels)
    }

    #[test]
    fn test_first_seen_order() {
        let index = LabelIndex::from_labels(["pos", "neg", "pos", "neutral"]);

        assert_eq!(index.labels(), ["pos", "neg", "neutral"]);
        assert_eq!(index.id("neg"), Ok(1));
        assert_eq!(index.label(2), Ok("neutral"));
    }

    #[test]
    fn test_multi_label_targets_are_flattened() {
        let targets = vec![multi(&["a", "b"]), multi(&[]), multi(&["c", "a"])];

        let index = LabelIndex::from_targets(&targets);

        assert_eq!(index.labels(), ["a", "b", "c"]);
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let index = LabelIndex::from_labels(["pos", "neg"]);

        assert_eq!(
            index.id("neutral"),
            Err(LabelError::UnknownLabel("neutral".to_string()))
        );
        assert_eq!(index.label(5), Err(LabelError::UnknownId(5)));
    }

    #[test]
    fn test_serializes_as_label_list() -> anyhow::Result<()> {
        let index = LabelIndex::from_labels(["b", "a"]);

        let json = serde_json::to_string(&index)?;
        assert_eq!(json, r#"["b","a"]"#);

        let restored: LabelIndex = serde_json::from_str(&json)?;
        assert_eq!(restored, index);

        Ok(())
    }

    #[test]
    fn test_binarizer_round_trip() -> anyhow::Result<()> {
        let binarizer = MultiLabelBinarizer::new(LabelIndex::from_labels(["a", "b", "c"]));

        let rows = binarizer.transform(&[
            vec!["c".to_string(), "a".to_string()],
            vec![],
        ])?;

        assert_eq!(rows, vec![vec![1, 0, 1], vec![0, 0, 0]]);
        assert_eq!(
            binarizer.inverse_transform(&rows),
            vec![vec!["a".to_string(), "c".to_string()], vec![]]
        );

        Ok(())
    }

    #[test]
    fn test_binarizer_rejects_unknown_label() {
        let binarizer = MultiLabelBinarizer::new(LabelIndex::from_labels(["a"]));

        assert_eq!(
            binarizer.transform_one(["z"]),
            Err(LabelError::UnknownLabel("z".to_string()))
        );
    }

    #[test]
    fn test_encode_targets() -> anyhow::Result<()> {
        let index = LabelIndex::from_labels(["neg", "pos"]);

        let one_hot = encode_targets(&index, None, &[Target::from("pos"), Target::from("neg")])?;
        assert_eq!(one_hot, vec![vec![0, 1], vec![1, 0]]);

        let binarizer = MultiLabelBinarizer::new(index.clone());
        let multi_hot = encode_targets(&index, Some(&binarizer), &[multi(&["neg", "pos"])])?;
        assert_eq!(multi_hot, vec![vec![1, 1]]);

        assert!(matches!(
            encode_targets(&index, Some(&binarizer), &[Target::from("pos")]),
            Err(LabelError::TargetKind { .. })
        ));

        Ok(())
    }

    proptest! {
        #[test]
        fn prop_label_id_round_trip(labels in prop::collection::vec("[a-z]{1,6}", 1..20)) {
            let index = LabelIndex::from_labels(&labels);

            for label in &labels {
                let id = index.id(label).unwrap();
                prop_assert!(id < index.len());
                prop_assert_eq!(index.label(id).unwrap(), label.as_str());
            }
        }

        #[test]
        fn prop_multi_hot_round_trip(
            classes in prop::collection::btree_set("[a-z]{1,6}", 1..10),
            picks in prop::collection::vec(any::<bool>(), 10),
        ) {
            let classes: Vec<String> = classes.into_iter().collect();
            let binarizer = MultiLabelBinarizer::new(LabelIndex::from_labels(&classes));

            let chosen: Vec<String> = classes
                .iter()
                .zip(&picks)
                .filter(|&(_, &pick)| pick)
                .map(|(label, _)| label.clone())
                .collect();

            let rows = binarizer.transform(&[chosen.clone()]).unwrap();
            let decoded = binarizer.inverse_transform(&rows);

            prop_assert_eq!(rows[0].len(), classes.len());
            prop_assert_eq!(
                decoded[0].iter().collect::<BTreeSet<_>>(),
                chosen.iter().collect::<BTreeSet<_>>()
            );
        }
    }
}
