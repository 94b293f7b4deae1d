/// Characters stripped from text before splitting into words
pub const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Lowercase the text, replace filtered punctuation with spaces, and split on whitespace
pub fn text_to_word_sequence(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if FILTERS.contains(c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
