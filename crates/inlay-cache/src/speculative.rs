//! Speculative fetch cache: prefetch-on-display
//!
//! The moment any suggestion is shown, the engine records "if the user
//! keeps typing, here is how to compute the next suggestion" as a lazy
//! fetch closure keyed by the completion's id. The closure reads the
//! document's state at *execution* time, not capture time, because the
//! user has kept typing between the stash and the consume.
//!
//! This is the only structure shared across documents. Keys are opaque
//! monotonically increasing ids, so entries of different documents never
//! collide. Capacity-bounded true LRU; eviction disposes the oldest entry
//! without invoking it.

use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::Mutex;

use lru::LruCache;
use tracing::debug;

use inlay_domain::CompletionId;

use crate::error::{CacheError, Result};

/// Future produced by a stashed fetch closure
pub type FetchFuture = Pin<Box<dyn Future<Output = Vec<String>> + Send>>;

/// One-shot fetch closure capturing how to compute the next suggestion
pub type FetchFn = Box<dyn FnOnce() -> FetchFuture + Send>;

/// Globally shared LRU of lazy fetch closures
///
/// Entries are consumed at most once: consuming removes the closure from
/// the cache before invoking it. The interior lock is never held across an
/// await; the closure is removed under the lock and driven after release.
pub struct SpeculativeFetchCache {
    inner: Mutex<LruCache<CompletionId, FetchFn>>,
}

impl SpeculativeFetchCache {
    /// Default capacity shared across all documents
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Create a cache with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY).expect("default capacity is non-zero")
    }

    /// Create a cache with an explicit capacity
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidCapacity` when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity =
            NonZeroUsize::new(capacity).ok_or(CacheError::InvalidCapacity(capacity))?;
        Ok(Self {
            inner: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Stash a fetch closure under a completion id
    ///
    /// Inserting beyond capacity evicts the oldest entry without invoking
    /// it.
    pub fn stash(&self, id: CompletionId, fetch: FetchFn) {
        let mut cache = self.inner.lock().unwrap();
        if cache.put(id, fetch).is_none() && cache.len() == cache.cap().get() {
            debug!(%id, "speculative cache at capacity, oldest entry will be evicted next");
        }
    }

    /// Remove and invoke the closure stashed under `id`
    ///
    /// Returns the fetched candidates, or an empty list when no entry
    /// exists (including when it was already consumed or evicted).
    pub async fn consume(&self, id: CompletionId) -> Vec<String> {
        let fetch = {
            let mut cache = self.inner.lock().unwrap();
            cache.pop(&id)
        };
        match fetch {
            Some(fetch) => {
                debug!(%id, "resolving speculative fetch");
                fetch().await
            }
            None => Vec::new(),
        }
    }

    /// Whether an unconsumed entry exists for `id`
    pub fn contains(&self, id: CompletionId) -> bool {
        self.inner.lock().unwrap().contains(&id)
    }

    /// Number of stashed entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries without invoking them
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

impl Default for SpeculativeFetchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_fetch(calls: Arc<AtomicUsize>, result: Vec<String>) -> FetchFn {
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { result })
        })
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            SpeculativeFetchCache::with_capacity(0),
            Err(CacheError::InvalidCapacity(0))
        ));
    }

    #[tokio::test]
    async fn test_consume_invokes_at_most_once() {
        let cache = SpeculativeFetchCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.stash(
            CompletionId(1),
            counting_fetch(calls.clone(), vec!["next".to_string()]),
        );

        assert_eq!(cache.consume(CompletionId(1)).await, vec!["next"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second consume: entry is gone, closure not re-invoked.
        assert!(cache.consume(CompletionId(1)).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_returns_empty() {
        let cache = SpeculativeFetchCache::new();
        assert!(cache.consume(CompletionId(42)).await.is_empty());
    }

    #[tokio::test]
    async fn test_eviction_disposes_oldest_without_invoking() {
        let cache = SpeculativeFetchCache::with_capacity(2).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        for i in 0..3 {
            cache.stash(CompletionId(i), counting_fetch(calls.clone(), vec![]));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(CompletionId(0)));
        assert!(cache.contains(CompletionId(1)));
        assert!(cache.contains(CompletionId(2)));
        // The evicted closure was dropped, never run.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_drops_everything() {
        let cache = SpeculativeFetchCache::new();
        cache.stash(CompletionId(1), Box::new(|| Box::pin(async { vec![] })));
        cache.clear();
        assert!(cache.is_empty());
    }
}
