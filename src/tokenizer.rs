use std::collections::{HashMap, HashSet};

lazy_static::lazy_static! {
    static ref STOPWORDS: HashSet<&'static str> = {
        [
            "a", "an", "the", "and", "or", "but", "if", "then", "else", "for",
            "to", "of", "in", "on", "at", "by", "with", "is", "are", "was",
            "were", "be", "been", "being", "it", "its", "as", "that", "this",
            "these", "those", "not", "no", "do", "does", "did", "how", "why",
            "what", "which", "who", "whom", "from",
        ]
        .iter()
        .copied()
        .collect()
    };
}

/// Split lowercased text into maximal `[a-z0-9]` runs.
fn split_terms(text: &str) -> Vec<String> {
    text.chars()
        .fold(vec![String::new()], |mut tokens, c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                if let Some(last) = tokens.last_mut() {
                    last.push(c);
                }
            } else if tokens.last().map_or(false, |s| !s.is_empty()) {
                tokens.push(String::new());
            }
            tokens
        })
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize text into index terms: lowercase, split on non-alphanumeric
/// runs, drop stop-words. No stemming.
///
/// This is the single definition of what counts as a term; indexing, query
/// scoring, and cache-key normalization all go through it.
pub fn tokenize(text: &str) -> Vec<String> {
    split_terms(&text.to_lowercase())
        .into_iter()
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .collect()
}

/// Tokenize and count raw term occurrences.
pub fn term_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for token in tokenize(text) {
        *frequencies.entry(token).or_insert(0) += 1;
    }
    frequencies
}

/// Canonical cache key for a query: its terms joined by a single space.
/// Queries that differ only in case, punctuation, or stop-words share a key.
pub fn normalize_query(query: &str) -> String {
    tokenize(query).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        let tokens = tokenize("Hello, World! Rust-lang 2024");
        assert_eq!(tokens, vec!["hello", "world", "rust", "lang", "2024"]);
    }

    #[test]
    fn test_tokenize_drops_stopwords() {
        let tokens = tokenize("the quick brown fox is in a hole");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "hole"]);
    }

    #[test]
    fn test_tokenize_degenerate_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ... ???").is_empty());
        assert!(tokenize("the of and").is_empty());
    }

    #[test]
    fn test_no_stemming() {
        let tokens = tokenize("engines indexing");
        assert_eq!(tokens, vec!["engines", "indexing"]);
    }

    #[test]
    fn test_term_frequencies() {
        let freqs = term_frequencies("search the search engines");
        assert_eq!(freqs.get("search"), Some(&2));
        assert_eq!(freqs.get("engines"), Some(&1));
        assert_eq!(freqs.get("the"), None);
    }

    #[test]
    fn test_normalize_query_insensitive_to_noise() {
        assert_eq!(normalize_query("The Search, Engines!"), "search engines");
        assert_eq!(
            normalize_query("search engines"),
            normalize_query("SEARCH... engines?")
        );
        assert_eq!(normalize_query("the of"), "");
    }
}
