use crate::cache::{CacheStats, LruCache};
use crate::markup;
use crate::model::Node;
use std::sync::Arc;

pub const DEFAULT_PARSE_CACHE_CAPACITY: usize = 1000;

/// Memoizes [`markup::parse`] by exact input string.
///
/// Trees are handed out as shared `Arc<[Node]>` slices; callers treat them as read-only.
#[derive(Debug)]
pub struct ParseCache {
    cache: LruCache<String, Arc<[Node]>>,
    parses: u64,
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_PARSE_CACHE_CAPACITY)
    }
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::named("parse", capacity),
            parses: 0,
        }
    }

    pub fn parse(&mut self, text: &str) -> Arc<[Node]> {
        if let Some(hit) = self.cache.get(text) {
            return Arc::clone(hit);
        }
        self.parses += 1;
        let nodes: Arc<[Node]> = markup::parse(text).into();
        self.cache.set(text.to_string(), Arc::clone(&nodes));
        nodes
    }

    /// Number of times the underlying parser actually ran.
    pub fn parse_count(&self) -> u64 {
        self.parses
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache(&self) -> &LruCache<String, Arc<[Node]>> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut LruCache<String, Arc<[Node]>> {
        &mut self.cache
    }
}
