use lru::LruCache;
use std::cell::RefCell;
use std::num::NonZeroUsize;

use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::error::Result;

/// Bounded LRU cache of embeddings keyed by normalized text
///
/// Single-threaded: uses `RefCell`, so a cache (and any `CachedEmbedder` holding
/// one) is not `Sync`.
pub struct EmbeddingCache {
    cache: RefCell<LruCache<String, Embedding>>,
}

impl EmbeddingCache {
    /// Create a new embedding cache with the specified capacity
    ///
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: RefCell::new(LruCache::new(cap)),
        }
    }

    /// Get a cached embedding, marking it as most recently used
    pub fn get(&self, text: &str) -> Option<Embedding> {
        self.cache.borrow_mut().get(text).cloned()
    }

    /// Store an embedding in the cache
    pub fn put(&self, text: String, embedding: Embedding) {
        self.cache.borrow_mut().put(text, embedding);
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }
}

/// Provider decorator that serves repeated texts from an [`EmbeddingCache`].
///
/// Errors from the wrapped provider are not cached.
pub struct CachedEmbedder<P> {
    inner: P,
    cache: EmbeddingCache,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            cache: EmbeddingCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn embed(&self, normalized_text: &str) -> Result<Embedding> {
        if let Some(cached) = self.cache.get(normalized_text) {
            log::debug!("Cache hit for text: {}", normalized_text);
            return Ok(cached);
        }

        let embedding = self.inner.embed(normalized_text)?;
        self.cache.put(normalized_text.to_string(), embedding.clone());
        Ok(embedding)
    }
}
