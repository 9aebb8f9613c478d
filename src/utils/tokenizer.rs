use rustc_hash::FxHashSet;

/// Maximum token length to store in the index.
/// Longer runs are almost always base64 blobs, hashes, or pasted dumps.
const MAX_TOKEN_LENGTH: usize = 128;

/// Split text into lowercase word tokens, preserving first-seen order.
///
/// A token is a maximal run of alphanumeric characters; everything else
/// (punctuation, brackets, whitespace) separates tokens. `[proposal]`
/// therefore yields `proposal`, and `PostgreSQL's` yields `postgresql`, `s`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut tokens = Vec::new();
    for token in words(text) {
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}

/// Extract the distinct token set of a document (title or message body).
pub fn extract_tokens(text: &str) -> FxHashSet<String> {
    words(text).collect()
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && w.len() <= MAX_TOKEN_LENGTH)
        .map(str::to_lowercase)
}

/// Case-insensitive form used for phrase comparisons.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
