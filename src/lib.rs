// Re-export main components
pub mod api;
pub mod cache;
pub mod document;
pub mod engine;
pub mod index;
pub mod ranking;
pub mod storage;
pub mod tokenizer;

// Re-export commonly used types
pub use cache::{CacheStats, LruCache};
pub use document::{load_corpus, Document};
pub use engine::{SearchEngine, SearchOutcome, ServiceStats};
pub use index::{DocId, Index, IndexStats, Posting};
pub use ranking::ScoredDocument;

// Re-export error types
pub use anyhow::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_workflow() -> Result<()> {
        let index = Index::build(vec![
            Document::new(
                "doc0.txt".to_string(),
                "search engines index documents".to_string(),
            ),
            Document::new("doc1.txt".to_string(), "search indexing works".to_string()),
        ]);

        let engine = SearchEngine::new(index, 64)?;

        let outcome = engine.search("search engines");
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].doc_id, 0);
        assert!(!outcome.was_cached);

        let again = engine.search("search engines");
        assert!(again.was_cached);
        assert_eq!(again.results, outcome.results);

        Ok(())
    }
}
