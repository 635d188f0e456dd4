/// Bounded memoization store, cleared wholesale when full.
use rustc_hash::FxHashMap;
use std::hash::Hash;

pub const DEFAULT_CACHE_CEILING: usize = 4096;

#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    map: FxHashMap<K, V>,
    ceiling: usize,
}

impl<K: Eq + Hash, V: Clone> BoundedCache<K, V> {
    pub fn new(ceiling: usize) -> Self {
        Self {
            map: FxHashMap::default(),
            ceiling: ceiling.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.map.len() >= self.ceiling {
            self.map.clear();
        }
        self.map.insert(key, value);
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, compute: F) -> V {
        if let Some(v) = self.map.get(&key) {
            return v.clone();
        }
        let v = compute();
        self.insert(key, v.clone());
        v
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_wholesale_at_ceiling() {
        let mut cache = BoundedCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        assert_eq!(cache.len(), 3);
        cache.insert("d", 4);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"d"), Some(4));
    }

    #[test]
    fn get_or_insert_computes_once() {
        let mut cache = BoundedCache::new(8);
        let mut calls = 0;
        let v1 = cache.get_or_insert_with("k".to_string(), || {
            calls += 1;
            7
        });
        let v2 = cache.get_or_insert_with("k".to_string(), || {
            calls += 1;
            8
        });
        assert_eq!((v1, v2, calls), (7, 7, 1));
    }
}
