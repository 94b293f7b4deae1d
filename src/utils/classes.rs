use std::hash::Hash;

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Hash + Eq,
    V: Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Return the index of the largest score, preferring the first on ties
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, &score)| match best {
            Some((_, top)) if score <= top => best,
            _ => Some((index, score)),
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_invert_map() {
        let label2id = HashMap::from([("neg".to_string(), 0), ("pos".to_string(), 1)]);

        let id2label: BTreeMap<usize, String> = invert_map(label2id);

        assert_eq!(id2label[&0], "neg");
        assert_eq!(id2label[&1], "pos");
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
