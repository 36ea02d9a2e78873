use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

/// Vacant link sentinel for the recency list.
const NIL: usize = usize::MAX;

#[derive(Debug, Error)]
#[error("cache capacity must be greater than zero")]
pub struct InvalidCapacity;

struct Node<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// Bounded LRU cache with O(1) get/put and hit/miss accounting.
///
/// The recency list is a doubly linked list over an arena of nodes addressed
/// by index; `head` is most-recently-used, `tail` least. Evicted slots are
/// recycled through a free list, so the arena never outgrows the capacity.
/// A disabled cache is the absence of an instance, not a zero capacity one:
/// construction rejects capacity 0.
pub struct LruCache<K, V> {
    capacity: usize,
    map: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity);
        }
        Ok(Self {
            capacity,
            map: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            hits: 0,
            misses: 0,
        })
    }

    /// Look up a key. A hit makes the entry most-recently-used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = match self.map.get(key) {
            Some(&idx) => idx,
            None => {
                self.misses += 1;
                return None;
            }
        };

        self.detach(idx);
        self.push_front(idx);
        self.hits += 1;
        Some(&self.nodes[idx].value)
    }

    /// Insert or overwrite, marking the entry most-recently-used. Evicts
    /// exactly the least-recently-used entry when over capacity.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            self.nodes[idx].value = value;
            self.detach(idx);
            self.push_front(idx);
            return;
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: NIL,
            next: NIL,
        };
        let idx = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        self.map.insert(key, idx);
        self.push_front(idx);

        if self.map.len() > self.capacity {
            self.evict_lru();
        }
    }

    /// Drop every entry. Hit/miss counters survive, they describe the
    /// cache's whole lifetime.
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            capacity: self.capacity,
            size: self.map.len(),
            hits: self.hits,
            misses: self.misses,
            hit_ratio: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    fn detach(&mut self, idx: usize) {
        let prev = self.nodes[idx].prev;
        let next = self.nodes[idx].next;

        if prev != NIL {
            self.nodes[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.nodes[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = NIL;
        self.nodes[idx].next = self.head;
        if self.head != NIL {
            self.nodes[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn evict_lru(&mut self) {
        let tail = self.tail;
        if tail == NIL {
            return;
        }
        self.detach(tail);
        let key = self.nodes[tail].key.clone();
        self.map.remove(&key);
        self.free.push(tail);
    }
}

/// Cache counters, exposed verbatim on the stats surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(LruCache::<String, u32>::new(0).is_err());
        assert!(LruCache::<String, u32>::new(1).is_ok());
    }

    #[test]
    fn test_eviction_order() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.put("c".to_string(), 3);

        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(&2));
        assert_eq!(cache.get(&"c".to_string()), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);

        // touching "a" makes "b" the eviction victim
        assert_eq!(cache.get(&"a".to_string()), Some(&1));
        cache.put("c".to_string(), 3);

        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(&1));
        assert_eq!(cache.get(&"c".to_string()), Some(&3));
    }

    #[test]
    fn test_overwrite_updates_value_and_recency() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.put("b".to_string(), 2);
        cache.put("a".to_string(), 10);
        cache.put("c".to_string(), 3);

        // "b" was least recently used after the overwrite of "a"
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(&10));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_holds_most_recently_touched_keys() {
        for capacity in [1usize, 3, 8] {
            let extra = 5;
            let mut cache = LruCache::new(capacity).unwrap();
            for i in 0..capacity + extra {
                cache.put(i, i * 10);
            }

            assert_eq!(cache.len(), capacity);
            for i in 0..extra {
                assert_eq!(cache.get(&i), None, "capacity {}", capacity);
            }
            for i in extra..capacity + extra {
                assert_eq!(cache.get(&i), Some(&(i * 10)), "capacity {}", capacity);
            }
        }
    }

    #[test]
    fn test_stats() {
        let mut cache = LruCache::new(4).unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hit_ratio, 0.0);
        assert_eq!(stats.size, 0);
        assert_eq!(stats.capacity, 4);

        cache.put("k".to_string(), 1);
        cache.get(&"k".to_string());
        cache.get(&"missing".to_string());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_ratio - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a".to_string(), 1);
        cache.get(&"a".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get(&"a".to_string()), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_slot_reuse_after_eviction() {
        let mut cache = LruCache::new(2).unwrap();
        for i in 0..100 {
            cache.put(i, i);
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&99), Some(&99));
        assert_eq!(cache.get(&98), Some(&98));
        // arena stays bounded by capacity plus one in-flight slot
        assert!(cache.nodes.len() <= 3);
    }
}
