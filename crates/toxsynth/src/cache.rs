//! Caller-owned memoization keyed by a structural hash of the inputs.
//!
//! Nothing is cached implicitly: the caller owns a [`SynthesisCache`], keys
//! it with a [`StructuralKey`] over every input that affects the result, and
//! drops or clears it when the input set changes.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;

/// SHA-256 digest of the canonical JSON form of a computation's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructuralKey([u8; 32]);

impl StructuralKey {
    /// Hash any serializable input snapshot.
    pub fn of<T: Serialize + ?Sized>(inputs: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(inputs)?;
        let mut key = [0u8; 32];
        key.copy_from_slice(&Sha256::digest(&bytes));
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Memoized results keyed by structural hash.
#[derive(Debug, Clone)]
pub struct SynthesisCache<V> {
    entries: HashMap<StructuralKey, V>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> SynthesisCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute(&mut self, key: StructuralKey, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.entries.get(&key) {
            self.hits += 1;
            debug!(key = %key, "synthesis cache hit");
            return value.clone();
        }
        self.misses += 1;
        let value = compute();
        self.entries.insert(key, value.clone());
        value
    }

    pub fn get(&self, key: &StructuralKey) -> Option<&V> {
        self.entries.get(key)
    }

    /// Keep only entries whose key passes the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&StructuralKey) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl<V: Clone> Default for SynthesisCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_structural() {
        let a = StructuralKey::of(&("ALT", "M", [1.0, 2.0])).unwrap();
        let b = StructuralKey::of(&("ALT", "M", [1.0, 2.0])).unwrap();
        let c = StructuralKey::of(&("ALT", "F", [1.0, 2.0])).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.to_string().starts_with("sha256:"));
        assert_eq!(a.to_string().len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_get_or_compute_counts() {
        let mut cache: SynthesisCache<u32> = SynthesisCache::new();
        let key = StructuralKey::of("k").unwrap();

        let mut calls = 0;
        let first = cache.get_or_compute(key, || {
            calls += 1;
            7
        });
        let second = cache.get_or_compute(key, || {
            calls += 1;
            8
        });

        assert_eq!((first, second), (7, 7));
        assert_eq!(calls, 1);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_retain_and_clear() {
        let mut cache: SynthesisCache<&str> = SynthesisCache::new();
        let keep = StructuralKey::of("keep").unwrap();
        let drop = StructuralKey::of("drop").unwrap();
        cache.get_or_compute(keep, || "a");
        cache.get_or_compute(drop, || "b");

        cache.retain(|k| *k == keep);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&keep).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
