//! In-memory LRU cache for text embeddings, keyed by content hash, so
//! repeated texts skip model inference (§4.9).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::types::EmbeddingVector;

const DEFAULT_MAX_SIZE: usize = 1000;

fn hash_key(text: &str, is_query: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}{digest}", if is_query { "q:" } else { "d:" })
}

struct Entry {
    value: EmbeddingVector,
    sequence: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    order: BTreeMap<u64, String>,
}

/// LRU cache over `(text, is_query)` pairs, evicting the
/// least-recently-used entry once `maxsize` is exceeded.
pub struct EmbeddingCache {
    maxsize: usize,
    inner: Mutex<Inner>,
    next_sequence: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(maxsize: usize) -> Self {
        Self { maxsize, inner: Mutex::new(Inner { entries: HashMap::new(), order: BTreeMap::new() }), next_sequence: AtomicU64::new(0), hits: AtomicU64::new(0), misses: AtomicU64::new(0) }
    }

    fn next_seq(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Look up a cached embedding, marking it most-recently-used on a hit.
    pub fn get(&self, text: &str, is_query: bool) -> Option<EmbeddingVector> {
        let key = hash_key(text, is_query);
        let mut inner = self.inner.lock();

        let Some(entry) = inner.entries.get(&key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let value = entry.value.clone();
        let old_sequence = entry.sequence;
        let new_sequence = self.next_seq();

        inner.order.remove(&old_sequence);
        inner.order.insert(new_sequence, key.clone());
        inner.entries.get_mut(&key).unwrap().sequence = new_sequence;

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Insert an embedding, evicting the oldest entry if at capacity.
    pub fn set(&self, text: &str, embedding: EmbeddingVector, is_query: bool) {
        let key = hash_key(text, is_query);
        let mut inner = self.inner.lock();

        while inner.entries.len() >= self.maxsize {
            let Some((&oldest_seq, oldest_key)) = inner.order.iter().next().map(|(k, v)| (k, v.clone())) else {
                break;
            };
            inner.order.remove(&oldest_seq);
            inner.entries.remove(&oldest_key);
        }

        if let Some(existing) = inner.entries.remove(&key) {
            inner.order.remove(&existing.sequence);
        }

        let sequence = self.next_seq();
        inner.order.insert(sequence, key.clone());
        inner.entries.insert(key, Entry { value: embedding, sequence });
    }

    /// Fetch from cache, or compute via `compute_fn` and cache the result.
    pub fn get_or_compute(&self, text: &str, is_query: bool, compute_fn: impl FnOnce(&str) -> crate::error::Result<EmbeddingVector>) -> crate::error::Result<EmbeddingVector> {
        if let Some(cached) = self.get(text, is_query) {
            return Ok(cached);
        }
        let embedding = compute_fn(text)?;
        self.set(text, embedding.clone(), is_query);
        Ok(embedding)
    }

    pub fn remove(&self, text: &str, is_query: bool) -> bool {
        let key = hash_key(text, is_query);
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.entries.remove(&key) {
            inner.order.remove(&entry.sequence);
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn size(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.size(),
            maxsize: self.maxsize,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub size: usize,
    pub maxsize: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(v: f32) -> EmbeddingVector {
        EmbeddingVector::new(vec![v])
    }

    #[test]
    fn caches_and_returns_hits() {
        let cache = EmbeddingCache::new(10);
        assert!(cache.get("hello", false).is_none());
        cache.set("hello", vector(1.0), false);
        assert_eq!(cache.get("hello", false), Some(vector(1.0)));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn query_and_document_prefixes_are_distinct_keys() {
        let cache = EmbeddingCache::new(10);
        cache.set("same text", vector(1.0), false);
        assert!(cache.get("same text", true).is_none());
    }

    #[test]
    fn evicts_least_recently_used_entry_at_capacity() {
        let cache = EmbeddingCache::new(2);
        cache.set("a", vector(1.0), false);
        cache.set("b", vector(2.0), false);
        cache.get("a", false); // a is now most-recently-used
        cache.set("c", vector(3.0), false); // evicts b
        assert!(cache.get("b", false).is_none());
        assert!(cache.get("a", false).is_some());
        assert!(cache.get("c", false).is_some());
    }

    #[test]
    fn hit_rate_reflects_hits_and_misses() {
        let cache = EmbeddingCache::new(10);
        cache.get("miss", false);
        cache.set("hit", vector(1.0), false);
        cache.get("hit", false);
        assert_eq!(cache.hit_rate(), 0.5);
    }
}
