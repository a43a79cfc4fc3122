use crate::models::question::AnswerKey;
use std::collections::HashSet;

// Long enough to tell distinct questions apart, short enough to absorb
// trailing phrasing drift.
const PREFIX_LEN: usize = 50;

// Tokens this short (articles, copulas, variable names) carry no signal.
const MIN_TOKEN_LEN: usize = 3;

/// Identity key for near-duplicate detection: normalized text prefix plus
/// the correct-answer letter.
pub fn fingerprint(text: &str, correct: AnswerKey) -> String {
    let prefix: String = text.trim().to_lowercase().chars().take(PREFIX_LEN).collect();
    format!("{}::{}", prefix, correct.as_char())
}

/// Bag-of-words overlap in [0, 1]: shared tokens over union size, counting
/// only words longer than `MIN_TOKEN_LEN`. Empty token sets score 0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    shared as f64 / union as f64
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}
