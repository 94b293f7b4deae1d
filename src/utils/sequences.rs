//! Host-side sequence shaping applied before token ids become tensors

/// Which end of a sequence receives padding
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Padding {
    /// Pad before the tokens
    Pre,
    /// Pad after the tokens
    Post,
}

/// Which end of an overlong sequence is cut
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Truncating {
    /// Drop tokens from the start, keeping the tail
    Pre,
    /// Drop tokens from the end, keeping the head
    Post,
}

/// Pad or truncate every sequence to exactly `max_len` entries
pub fn pad_sequences(
    sequences: &[Vec<usize>],
    max_len: usize,
    pad_value: usize,
    padding: Padding,
    truncating: Truncating,
) -> Vec<Vec<usize>> {
    sequences
        .iter()
        .map(|tokens| pad_sequence(tokens, max_len, pad_value, padding, truncating))
        .collect()
}

/// Pad or truncate a single sequence to exactly `max_len` entries
pub fn pad_sequence(
    tokens: &[usize],
    max_len: usize,
    pad_value: usize,
    padding: Padding,
    truncating: Truncating,
) -> Vec<usize> {
    let kept = if tokens.len() > max_len {
        match truncating {
            Truncating::Pre => &tokens[tokens.len() - max_len..],
            Truncating::Post => &tokens[..max_len],
        }
    } else {
        tokens
    };

    let fill = std::iter::repeat(pad_value).take(max_len - kept.len());

    match padding {
        Padding::Post => kept.iter().copied().chain(fill).collect(),
        Padding::Pre => fill.chain(kept.iter().copied()).collect(),
    }
}

/// The length found at the given quantile of the sorted lengths, `sorted[floor(q * n)]`
pub fn quantile_length<I>(lengths: I, quantile: f64) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    let mut lengths: Vec<usize> = lengths.into_iter().collect();
    if lengths.is_empty() {
        return None;
    }

    lengths.sort_unstable();

    let index = ((quantile * lengths.len() as f64) as usize).min(lengths.len() - 1);

    Some(lengths[index])
}
