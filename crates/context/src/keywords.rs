//! Keyword extraction.
//!
//! Tokens are maximal runs of alphanumeric characters (plus `_` and `-`
//! inside a word), lower-cased. A compound such as `f1-score` also yields
//! its parts, so `f1` and `score` match it. Single characters and
//! stop-words are dropped. The context documents of the original deployment were Italian,
//! so both English and Italian function words are filtered.

use std::collections::BTreeSet;

const MIN_TOKEN_CHARS: usize = 2;

#[rustfmt::skip]
const STOP_WORDS: &[&str] = &[
    // English
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "before", "being", "but", "by", "can", "could", "did", "do",
    "does", "each", "for", "from", "had", "has", "have", "he", "her", "his",
    "how", "if", "in", "into", "is", "it", "its", "may", "more", "most", "no",
    "not", "of", "on", "only", "or", "other", "our", "out", "over", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
    // Italian
    "al", "alla", "alle", "agli", "ai", "anche", "che", "chi", "ci", "come",
    "con", "cui", "da", "dal", "dalla", "dei", "del", "della", "delle", "dello",
    "degli", "di", "due", "ed", "era", "gli", "ha", "hanno", "il", "la", "le",
    "lo", "ma", "ne", "nei", "nel", "nella", "nelle", "non", "o", "per", "più",
    "può", "se", "si", "sono", "su", "sul", "sulla", "tra", "fra", "un", "una",
    "uno", "è",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Extract the de-duplicated keyword set of a text.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for raw in text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-')) {
        let word = raw.trim_matches(|c: char| c == '_' || c == '-');
        insert_token(&mut tokens, word);
        if word.contains(['_', '-']) {
            for part in word.split(['_', '-']) {
                insert_token(&mut tokens, part);
            }
        }
    }
    tokens
}

fn insert_token(tokens: &mut BTreeSet<String>, word: &str) {
    if word.chars().count() < MIN_TOKEN_CHARS {
        return;
    }
    let token = word.to_lowercase();
    if !is_stop_word(&token) {
        tokens.insert(token);
    }
}

/// Normalise caller-supplied query keywords the same way section keywords
/// are normalised. Multi-word entries contribute each of their tokens.
pub fn normalize_query<I, S>(keywords: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .flat_map(|k| tokenize(k.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_lowercased_and_deduplicated() {
        let tokens = tokenize("Precision and precision, PRECISION!");
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains("precision"));
    }

    #[test]
    fn stop_words_and_short_tokens_dropped() {
        let tokens = tokenize("the recall of a model è x");
        assert!(tokens.contains("recall"));
        assert!(tokens.contains("model"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("of"));
        assert!(!tokens.contains("è"));
        assert!(!tokens.contains("x"));
    }

    #[test]
    fn identifiers_survive() {
        let tokens = tokenize("method *query-vat_number* beat azure_model");
        assert!(tokens.contains("query-vat_number"));
        assert!(tokens.contains("azure_model"));
        assert!(tokens.contains("vat"));
        assert!(tokens.contains("azure"));
    }

    #[test]
    fn compounds_also_yield_their_parts() {
        let tokens = tokenize("F1-score and the False-positive rate");
        assert!(tokens.contains("f1-score"));
        assert!(tokens.contains("f1"));
        assert!(tokens.contains("score"));
        assert!(tokens.contains("false-positive"));
        assert!(tokens.contains("false"));
        assert!(tokens.contains("positive"));
    }

    #[test]
    fn compound_parts_still_filtered() {
        let tokens = tokenize("state-of-the-art x-ray");
        assert!(tokens.contains("state-of-the-art"));
        assert!(tokens.contains("state"));
        assert!(tokens.contains("art"));
        assert!(tokens.contains("ray"));
        assert!(!tokens.contains("of"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("x"));
    }

    #[test]
    fn unicode_words_are_kept() {
        let tokens = tokenize("Qualità della validazione");
        assert!(tokens.contains("qualità"));
        assert!(tokens.contains("validazione"));
        assert!(!tokens.contains("della"));
    }

    #[test]
    fn query_normalisation_splits_phrases() {
        let query = normalize_query(["False Positive", "  FN ", ""]);
        let expected: BTreeSet<String> = ["false", "positive", "fn"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(query, expected);
    }
}
