//! Bounded citation lookup cache (Moka, capacity + TTL).
//!
//! Keyed by citation id, so callers can resolve a citation referenced by a
//! previously returned response without re-running verification.

use std::time::Duration;

use moka::sync::Cache;

use crate::config::CacheConfig;
use crate::types::Citation;

pub struct CitationCache {
    inner: Cache<String, Citation>,
}

impl CitationCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.ttl_secs))
    }

    pub fn get(&self, id: &str) -> Option<Citation> {
        self.inner.get(id)
    }

    pub fn insert(&self, citation: Citation) {
        self.inner.insert(citation.id.clone(), citation);
    }

    pub fn insert_all(&self, citations: &[Citation]) {
        for citation in citations {
            self.insert(citation.clone());
        }
    }

    pub fn invalidate(&self, id: &str) {
        self.inner.invalidate(id);
    }

    /// Approximate entry count (Moka updates it lazily).
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for CitationCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
