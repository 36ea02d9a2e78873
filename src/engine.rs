use crate::cache::{CacheStats, LruCache};
use crate::index::{Index, IndexStats};
use crate::ranking::{self, ScoredDocument};
use crate::tokenizer;
use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Outcome of one service call. `snapshot` is the index generation the
/// results were scored against, so callers resolving doc ids back to
/// sources or text never mix generations with a concurrent rebuild.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<ScoredDocument>,
    pub elapsed: Duration,
    pub was_cached: bool,
    pub snapshot: Arc<Index>,
}

#[derive(Default)]
struct QueryCounters {
    total_queries: u64,
    total_time: Duration,
}

/// Search service: wraps the query engine with cache-key normalization,
/// LRU result caching, and per-call latency accounting.
///
/// The index is shared as an `Arc` snapshot — readers clone it under a read
/// lock, so a rebuild swapped in by `replace_index` is never observed half
/// built. Cache and counters are the only mutable state and each sits
/// behind its own mutex.
pub struct SearchEngine {
    index: RwLock<Arc<Index>>,
    cache: Option<Mutex<LruCache<String, Vec<ScoredDocument>>>>,
    counters: Mutex<QueryCounters>,
}

impl SearchEngine {
    /// Create a service over a built index. `cache_capacity` of 0 disables
    /// caching entirely; any positive value bounds the result cache.
    pub fn new(index: Index, cache_capacity: usize) -> Result<Self> {
        let cache = if cache_capacity > 0 {
            Some(Mutex::new(LruCache::new(cache_capacity)?))
        } else {
            None
        };

        Ok(Self {
            index: RwLock::new(Arc::new(index)),
            cache,
            counters: Mutex::new(QueryCounters::default()),
        })
    }

    /// Current index snapshot. Callers can keep reading it while a rebuild
    /// swaps in a replacement.
    pub fn snapshot(&self) -> Arc<Index> {
        self.index.read().unwrap().clone()
    }

    /// Run a query through the cache and the query engine.
    ///
    /// Every call is counted and timed, including degenerate ones. A query
    /// that trims or normalizes to nothing short-circuits to an empty,
    /// uncached result. Cache keys are normalized term sequences, so two
    /// wordings that tokenize identically share an entry. Only non-empty
    /// result lists are cached.
    pub fn search(&self, query: &str) -> SearchOutcome {
        let start = Instant::now();

        let trimmed = query.trim();
        if trimmed.is_empty() {
            let snapshot = self.snapshot();
            return self.finish(start, Vec::new(), false, snapshot);
        }

        let key = tokenizer::normalize_query(trimmed);
        if key.is_empty() {
            let snapshot = self.snapshot();
            return self.finish(start, Vec::new(), false, snapshot);
        }

        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().unwrap();
            if let Some(results) = guard.get(&key).cloned() {
                // replace_index swaps and clears under this same lock, so
                // any entry still present belongs to the published index
                let snapshot = self.index.read().unwrap().clone();
                drop(guard);
                tracing::debug!("Cache hit for key '{}'", key);
                return self.finish(start, results, true, snapshot);
            }
        }

        let snapshot = self.snapshot();
        let results = ranking::search(trimmed, &snapshot);
        self.cache_results(&snapshot, key, results.clone());

        self.finish(start, results, false, snapshot)
    }

    /// Cache a non-empty result list, but only if the index it was scored
    /// against is still the published one. A rebuild landing between the
    /// scoring and this insert would otherwise resurrect stale results
    /// right after the cache was invalidated.
    fn cache_results(&self, scored_from: &Arc<Index>, key: String, results: Vec<ScoredDocument>) {
        if results.is_empty() {
            return;
        }
        if let Some(cache) = &self.cache {
            let mut guard = cache.lock().unwrap();
            if Arc::ptr_eq(scored_from, &self.index.read().unwrap()) {
                guard.put(key, results);
            } else {
                tracing::debug!("Dropping results for '{}': index was replaced", key);
            }
        }
    }

    /// Publish a freshly built index and invalidate the result cache. The
    /// swap is atomic with respect to in-flight queries: they finish on the
    /// snapshot they already hold, and their results never re-enter the
    /// cache. Swap and clear happen under the cache lock so lookups never
    /// see a cleared cache refill with old-generation entries.
    pub fn replace_index(&self, index: Index) {
        match &self.cache {
            Some(cache) => {
                let mut guard = cache.lock().unwrap();
                *self.index.write().unwrap() = Arc::new(index);
                guard.clear();
            }
            None => {
                *self.index.write().unwrap() = Arc::new(index);
            }
        }
        tracing::info!("Index replaced, result cache invalidated");
    }

    pub fn stats(&self) -> ServiceStats {
        let (total_queries, avg_latency_ms) = {
            let counters = self.counters.lock().unwrap();
            let avg = if counters.total_queries == 0 {
                0.0
            } else {
                counters.total_time.as_secs_f64() * 1000.0 / counters.total_queries as f64
            };
            (counters.total_queries, avg)
        };

        ServiceStats {
            total_queries,
            avg_latency_ms,
            cache: self.cache.as_ref().map(|c| c.lock().unwrap().stats()),
            index: self.snapshot().stats(),
        }
    }

    fn finish(
        &self,
        start: Instant,
        results: Vec<ScoredDocument>,
        was_cached: bool,
        snapshot: Arc<Index>,
    ) -> SearchOutcome {
        let elapsed = start.elapsed();
        {
            let mut counters = self.counters.lock().unwrap();
            counters.total_queries += 1;
            counters.total_time += elapsed;
        }
        SearchOutcome {
            results,
            elapsed,
            was_cached,
            snapshot,
        }
    }
}

/// Aggregate service counters plus the cache's and index's own stats.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub total_queries: u64,
    pub avg_latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStats>,
    pub index: IndexStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn sample_engine(cache_capacity: usize) -> SearchEngine {
        let index = Index::build(vec![
            Document::new(
                "doc0.txt".to_string(),
                "search engines index documents".to_string(),
            ),
            Document::new("doc1.txt".to_string(), "search indexing works".to_string()),
        ]);
        SearchEngine::new(index, cache_capacity).unwrap()
    }

    #[test]
    fn test_repeated_query_hits_cache() {
        let engine = sample_engine(16);

        let first = engine.search("search engines");
        assert!(!first.was_cached);
        assert_eq!(first.results.len(), 1);

        let second = engine.search("search engines");
        assert!(second.was_cached);
        assert_eq!(second.results, first.results);

        let stats = engine.stats();
        let cache = stats.cache.unwrap();
        assert_eq!(cache.hits, 1);
        assert_eq!(cache.misses, 1);
        assert_eq!(stats.total_queries, 2);
    }

    #[test]
    fn test_differently_worded_queries_share_entry() {
        let engine = sample_engine(16);
        engine.search("Search... ENGINES!");
        let outcome = engine.search("the search engines");
        assert!(outcome.was_cached);
    }

    #[test]
    fn test_empty_query_short_circuits_but_counts() {
        let engine = sample_engine(16);

        let outcome = engine.search("   ");
        assert!(outcome.results.is_empty());
        assert!(!outcome.was_cached);

        let outcome = engine.search("the of and");
        assert!(outcome.results.is_empty());
        assert!(!outcome.was_cached);

        let stats = engine.stats();
        assert_eq!(stats.total_queries, 2);
        // degenerate queries never touch the cache
        assert_eq!(stats.cache.unwrap().misses, 0);
    }

    #[test]
    fn test_empty_results_not_cached() {
        let engine = sample_engine(16);
        engine.search("zebra");
        engine.search("zebra");

        let cache = engine.stats().cache.unwrap();
        assert_eq!(cache.hits, 0);
        assert_eq!(cache.misses, 2);
        assert_eq!(cache.size, 0);
    }

    #[test]
    fn test_caching_disabled() {
        let engine = sample_engine(0);

        let first = engine.search("search engines");
        let second = engine.search("search engines");
        assert!(!first.was_cached);
        assert!(!second.was_cached);
        assert_eq!(first.results, second.results);
        assert!(engine.stats().cache.is_none());
    }

    #[test]
    fn test_replace_index_invalidates_cache() {
        let engine = sample_engine(16);
        engine.search("search engines");

        engine.replace_index(Index::build(vec![Document::new(
            "new.txt".to_string(),
            "entirely different corpus".to_string(),
        )]));

        let outcome = engine.search("search engines");
        assert!(!outcome.was_cached);
        assert!(outcome.results.is_empty());

        let fresh = engine.search("different corpus");
        assert_eq!(fresh.results.len(), 1);
        assert_eq!(fresh.results[0].doc_id, 0);
    }

    #[test]
    fn test_stats_before_any_query() {
        let engine = sample_engine(16);
        let stats = engine.stats();
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
        assert_eq!(stats.index.documents, 2);
    }

    #[test]
    fn test_results_from_replaced_index_never_enter_cache() {
        // miss in flight: results were scored on the old index, and the
        // corpus is replaced before they reach the cache
        let engine = SearchEngine::new(
            Index::build(vec![
                Document::new("filler.txt".to_string(), "filler text here".to_string()),
                Document::new(
                    "old.txt".to_string(),
                    "search engines index documents".to_string(),
                ),
            ]),
            16,
        )
        .unwrap();

        let old = engine.snapshot();
        let stale = ranking::search("search engines", &old);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].doc_id, 1);

        engine.replace_index(Index::build(vec![Document::new(
            "new.txt".to_string(),
            "search engines elsewhere".to_string(),
        )]));
        engine.cache_results(&old, "search engines".to_string(), stale);

        // the stale insert must have been dropped: the next lookup misses
        // and is answered from the new generation
        let outcome = engine.search("search engines");
        assert!(!outcome.was_cached);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].doc_id, 0);

        // while results scored on the still-published index do get cached
        let again = engine.search("search engines");
        assert!(again.was_cached);
    }

    #[test]
    fn test_outcome_snapshot_matches_results() {
        let engine = sample_engine(16);

        let outcome = engine.search("search engines");
        assert!(Arc::ptr_eq(&outcome.snapshot, &engine.snapshot()));
        assert_eq!(outcome.snapshot.text(0), Some("search engines index documents"));

        engine.replace_index(Index::build(vec![Document::new(
            "new.txt".to_string(),
            "entirely different corpus".to_string(),
        )]));

        // both the miss and the subsequent hit carry the new generation
        let miss = engine.search("different corpus");
        assert!(!miss.was_cached);
        assert!(Arc::ptr_eq(&miss.snapshot, &engine.snapshot()));

        let hit = engine.search("different corpus");
        assert!(hit.was_cached);
        assert!(Arc::ptr_eq(&hit.snapshot, &engine.snapshot()));
        assert_eq!(hit.snapshot.text(0), Some("entirely different corpus"));
    }

    #[test]
    fn test_snapshot_survives_replacement() {
        let engine = sample_engine(16);
        let old = engine.snapshot();
        engine.replace_index(Index::build(Vec::new()));

        // the held snapshot still answers consistently
        assert_eq!(old.doc_count(), 2);
        assert_eq!(engine.snapshot().doc_count(), 0);
    }
}
