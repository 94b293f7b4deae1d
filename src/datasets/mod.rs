use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Labelled text rows in CSV files
pub mod csv;

/// Positive / negative sentence corpora
pub mod polarity;

/// Dataset Error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// Inputs and labels must be parallel arrays
    #[error("inputs and labels differ in length ({inputs} inputs, {labels} labels)")]
    LengthMismatch {
        /// The number of inputs
        inputs: usize,
        /// The number of labels
        labels: usize,
    },

    /// The test fraction must leave examples on both sides of the split
    #[error("cannot split {examples} examples with a test size of {test_size}")]
    InvalidSplit {
        /// The number of examples
        examples: usize,
        /// The requested test fraction
        test_size: f64,
    },

    /// A row has no usable text or label
    #[error("malformed row {row}: {reason}")]
    MalformedRow {
        /// The zero-based row index
        row: usize,
        /// What is wrong with the row
        reason: String,
    },

    /// No examples were found
    #[error("no examples found in {0}")]
    Empty(String),
}

/// Shuffle parallel arrays and split them into train and test parts
///
/// The test part holds `ceil(test_size * N)` examples. Returns `(x_train, x_test, y_train,
/// y_test)`.
pub fn train_test_split<X: Clone, Y: Clone>(
    x: &[X],
    y: &[Y],
    test_size: f64,
    seed: Option<u64>,
) -> Result<(Vec<X>, Vec<X>, Vec<Y>, Vec<Y>), DatasetError> {
    if x.len() != y.len() {
        return Err(DatasetError::LengthMismatch {
            inputs: x.len(),
            labels: y.len(),
        });
    }

    let examples = x.len();
    let test_len = (test_size * examples as f64).ceil() as usize;

    if !(test_size > 0.0 && test_size < 1.0) || test_len == 0 || test_len >= examples {
        return Err(DatasetError::InvalidSplit {
            examples,
            test_size,
        });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut indices = (0..examples).collect::<Vec<_>>();
    indices.shuffle(&mut rng);

    let (test, train) = indices.split_at(test_len);

    let pick_x = |ids: &[usize]| ids.iter().map(|&i| x[i].clone()).collect::<Vec<_>>();
    let pick_y = |ids: &[usize]| ids.iter().map(|&i| y[i].clone()).collect::<Vec<_>>();

    Ok((pick_x(train), pick_x(test), pick_y(train), pick_y(test)))
}
