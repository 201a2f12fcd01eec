//! Shared fitness memoization.
//!
//! [`FitnessCache`] is a collaborator for chromosome implementations whose
//! fitness is expensive and whose values repeat across generations. It is
//! owned by the chromosome factory or the driver (typically behind an
//! [`Arc`](std::sync::Arc) that every chromosome holds) and never by the
//! engine.
//!
//! Entries sit in a sharded [`DashMap`], so many recombination tasks can
//! consult the cache at once. Entries live until [`clear`](FitnessCache::clear).

use dashmap::DashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent memo of fitness scores keyed by chromosome value.
///
/// # Examples
///
/// ```
/// use u_evolve::cache::FitnessCache;
///
/// let cache: FitnessCache<String, i32> = FitnessCache::new();
/// let score = cache.get_or_compute("abc", || 42);
/// assert_eq!(score, 42);
/// assert_eq!(cache.get_or_compute("abc", || unreachable!()), 42);
/// assert_eq!(cache.hits(), 1);
/// assert_eq!(cache.misses(), 1);
/// ```
pub struct FitnessCache<K, S> {
    entries: DashMap<K, S>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Eq + Hash, S: Copy> FitnessCache<K, S> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a cache with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached score for `key` without computing it.
    pub fn get<Q>(&self, key: &Q) -> Option<S>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| *entry.value())
    }

    /// Returns the cached score for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without holding a shard lock. Two threads missing on the
    /// same key may both compute it; since fitness is pure, the first stored
    /// value wins and both return the same score.
    pub fn get_or_compute<Q, F>(&self, key: &Q, compute: F) -> S
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce() -> S,
    {
        if let Some(score) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return score;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let score = compute();
        *self.entries.entry(key.to_owned()).or_insert(score).value()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that had to compute the score.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drops every entry and resets the counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl<K: Eq + Hash, S: Copy> fmt::Debug for FitnessCache<K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitnessCache")
            .field("len", &self.entries.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}

impl<K: Eq + Hash, S: Copy> Default for FitnessCache<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_miss_then_hit() {
        let cache: FitnessCache<String, i16> = FitnessCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.get("abc"), None);

        assert_eq!(cache.get_or_compute("abc", || -7), -7);
        assert_eq!(cache.get_or_compute("abc", || 99), -7);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("abc"), Some(-7));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_clear() {
        let cache: FitnessCache<Vec<u8>, f64> = FitnessCache::with_capacity(4);
        cache.get_or_compute([1u8, 2].as_slice(), || 0.5);
        cache.get_or_compute([3u8].as_slice(), || 1.5);
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
        assert_eq!(cache.get([1u8, 2].as_slice()), None);
    }

    #[test]
    fn test_concurrent_readers() {
        let cache: FitnessCache<u32, i64> = FitnessCache::new();
        let computed = AtomicUsize::new(0);

        (0..1000u32).into_par_iter().for_each(|i| {
            let key = i % 10;
            let score = cache.get_or_compute(&key, || {
                computed.fetch_add(1, Ordering::Relaxed);
                -(key as i64)
            });
            assert_eq!(score, -(key as i64));
        });

        assert_eq!(cache.len(), 10);
        assert_eq!(cache.hits() + cache.misses(), 1000);
        assert!(computed.load(Ordering::Relaxed) >= 10);
    }

    #[test]
    fn test_first_stored_score_wins() {
        let cache: FitnessCache<String, i32> = FitnessCache::new();
        let scores: Vec<i32> = (0..64)
            .into_par_iter()
            .map(|i| cache.get_or_compute("shared", || i))
            .collect();

        // Racing misses may compute different values, but only one is kept
        // and every caller sees it.
        let stored = cache.get("shared").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(scores.iter().all(|&score| score == stored));
        assert_eq!(cache.get_or_compute("shared", || -1), stored);
    }
}
