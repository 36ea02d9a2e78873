use crate::document::Document;
use crate::tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Dense, zero-based document identifier, assigned in ingestion order and
/// stable for the lifetime of one built index.
pub type DocId = usize;

/// One postings entry: a document containing the term, with its raw
/// term frequency (always >= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: usize,
}

/// Inverted index with TF-IDF weights, built in one batch pass and
/// read-only afterwards. Rebuilding a corpus produces a new `Index` value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    doc_count: usize,
    /// term -> postings sorted ascending by doc_id, one entry per document
    postings: HashMap<String, Vec<Posting>>,
    /// term -> number of documents containing it
    document_frequency: HashMap<String, usize>,
    /// term -> ln((N+1)/(df+1)) + 1, fixed at build time
    idf: HashMap<String, f64>,
    /// doc_id -> Euclidean norm of the document's TF-IDF vector
    doc_norms: Vec<f64>,
    /// doc_id -> source identifier (file path or upload name)
    sources: Vec<String>,
    /// doc_id -> raw text, kept for snippet/title presentation only
    texts: Vec<String>,
}

impl Index {
    /// Build an index from documents in their given order. Documents whose
    /// text is empty after trimming are skipped and never receive an id.
    pub fn build<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut sources = Vec::new();
        let mut texts = Vec::new();

        for doc in documents {
            if doc.text.trim().is_empty() {
                tracing::warn!("Skipping empty document from {}", doc.source);
                continue;
            }

            let doc_id = sources.len();
            for (term, tf) in tokenizer::term_frequencies(&doc.text) {
                postings
                    .entry(term.clone())
                    .or_default()
                    .push(Posting { doc_id, tf });
                *document_frequency.entry(term).or_insert(0) += 1;
            }

            sources.push(doc.source);
            texts.push(doc.text);
        }

        for plist in postings.values_mut() {
            plist.sort_by_key(|p| p.doc_id);
        }

        let doc_count = sources.len();
        let n = doc_count as f64;
        let idf: HashMap<String, f64> = document_frequency
            .iter()
            .map(|(term, &df)| {
                (term.clone(), ((n + 1.0) / (df as f64 + 1.0)).ln() + 1.0)
            })
            .collect();

        let mut doc_norms = vec![0.0_f64; doc_count];
        for (term, plist) in &postings {
            let w_idf = idf[term];
            for posting in plist {
                let w_tf = 1.0 + (posting.tf as f64).ln();
                doc_norms[posting.doc_id] += (w_tf * w_idf).powi(2);
            }
        }
        for norm in &mut doc_norms {
            *norm = norm.sqrt();
        }

        tracing::info!(
            "Built index: {} documents, {} distinct terms",
            doc_count,
            postings.len()
        );

        Self {
            doc_count,
            postings,
            document_frequency,
            idf,
            doc_norms,
            sources,
            texts,
        }
    }

    /// Total number of indexed documents (N).
    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(|p| p.as_slice())
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    pub fn idf(&self, term: &str) -> f64 {
        self.idf.get(term).copied().unwrap_or(0.0)
    }

    /// Precomputed vector norm; 0.0 for documents with no indexed terms.
    pub fn doc_norm(&self, doc_id: DocId) -> f64 {
        self.doc_norms.get(doc_id).copied().unwrap_or(0.0)
    }

    pub fn source(&self, doc_id: DocId) -> Option<&str> {
        self.sources.get(doc_id).map(|s| s.as_str())
    }

    pub fn text(&self, doc_id: DocId) -> Option<&str> {
        self.texts.get(doc_id).map(|s| s.as_str())
    }

    /// Raw term frequency of `term` in `doc_id`, if that document contains
    /// it. Postings are sorted by doc_id, so this is a binary search.
    pub fn term_frequency(&self, term: &str, doc_id: DocId) -> Option<usize> {
        let plist = self.postings.get(term)?;
        plist
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| plist[i].tf)
    }

    /// Documents containing every distinct term (AND semantics). Returns an
    /// empty list as soon as any term has no postings. Intersection starts
    /// from the shortest postings list.
    pub fn conjunctive_candidates(&self, terms: &[String]) -> Vec<DocId> {
        if terms.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut lists: Vec<&Vec<Posting>> = Vec::new();
        for term in terms {
            if !seen.insert(term.as_str()) {
                continue;
            }
            match self.postings.get(term) {
                Some(plist) => lists.push(plist),
                None => return Vec::new(),
            }
        }

        lists.sort_by_key(|l| l.len());

        let mut candidates: Vec<DocId> = lists[0].iter().map(|p| p.doc_id).collect();
        for plist in &lists[1..] {
            let ids: Vec<DocId> = plist.iter().map(|p| p.doc_id).collect();
            candidates = intersection(&candidates, &ids);
            if candidates.is_empty() {
                break;
            }
        }
        candidates
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.doc_count,
            terms: self.postings.len(),
            postings_entries: self.postings.values().map(|p| p.len()).sum(),
        }
    }
}

/// Intersection of two sorted doc-id slices.
fn intersection(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut result = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            i += 1;
        } else if a[i] > b[j] {
            j += 1;
        } else {
            result.push(a[i]);
            i += 1;
            j += 1;
        }
    }

    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub terms: usize,
    pub postings_entries: usize,
}
