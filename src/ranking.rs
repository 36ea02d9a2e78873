use crate::index::{DocId, Index};
use crate::tokenizer;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f64,
}

/// AND-retrieval with TF-IDF scoring and cosine-style normalization.
///
/// Only documents containing every distinct query term match; if any term
/// has no postings at all the result is empty. Results are sorted by score
/// descending, ties broken by ascending doc_id. Pure read over the index,
/// never an error: an empty or all-stopword query just yields no results.
pub fn search(query: &str, index: &Index) -> Vec<ScoredDocument> {
    let terms = tokenizer::tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let candidates = index.conjunctive_candidates(&terms);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let distinct: Vec<&String> = terms.iter().filter(|t| seen.insert(t.as_str())).collect();

    let mut results = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        let mut score = 0.0;
        for term in &distinct {
            // every candidate survived the intersection, so tf is present
            if let Some(tf) = index.term_frequency(term.as_str(), doc_id) {
                score += (1.0 + (tf as f64).ln()) * index.idf(term.as_str());
            }
        }

        let norm = index.doc_norm(doc_id);
        if norm > 0.0 {
            score /= norm;
        }

        results.push(ScoredDocument { doc_id, score });
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    results
}
