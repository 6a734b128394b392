
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::base::{CooccurrenceScorer, LookupError, MembershipOracle, PmiScore};

pub struct LookupCache<T> {
    cache: Mutex<LruCache<String, (T, Instant)>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub hit_rate: f64,
}

impl<T: Clone> LookupCache<T> {
    pub fn new(capacity: usize, ttl_secs: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut cache = self.cache.lock();
        match cache.get(key) {
            Some((value, timestamp)) if timestamp.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: T) {
        let mut cache = self.cache.lock();
        cache.put(key.to_string(), (value, Instant::now()));
    }

    pub fn make_key<S: AsRef<str>>(source: &str, parts: &[S]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        for part in parts {
            hasher.update([0u8]);
            hasher.update(part.as_ref().as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };
        let cache = self.cache.lock();

        CacheStats {
            hits,
            misses,
            size: cache.len(),
            hit_rate,
        }
    }
}


pub struct CachedMembership {
    inner: Arc<dyn MembershipOracle>,
    cache: LookupCache<bool>,
}

impl CachedMembership {
    pub fn new(inner: Arc<dyn MembershipOracle>, capacity: usize, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache: LookupCache::new(capacity, ttl_secs),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl MembershipOracle for CachedMembership {
    async fn exists(&self, candidates: &[String]) -> Result<bool, LookupError> {
        let key = LookupCache::<bool>::make_key(self.inner.source_name(), candidates);
        if let Some(hit) = self.cache.get(&key) {
            debug!("{} cache HIT", self.inner.source_name());
            return Ok(hit);
        }

        // Failures are not cached.
        let found = self.inner.exists(candidates).await?;
        self.cache.set(&key, found);
        Ok(found)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}


pub struct CachedScorer {
    inner: Arc<dyn CooccurrenceScorer>,
    cache: LookupCache<PmiScore>,
}

impl CachedScorer {
    pub fn new(inner: Arc<dyn CooccurrenceScorer>, capacity: usize, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache: LookupCache::new(capacity, ttl_secs),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[async_trait]
impl CooccurrenceScorer for CachedScorer {
    async fn score(&self, phrase: &str) -> Result<PmiScore, LookupError> {
        let key = LookupCache::<PmiScore>::make_key(self.inner.source_name(), &[phrase]);
        if let Some(hit) = self.cache.get(&key) {
            debug!("{} cache HIT", self.inner.source_name());
            return Ok(hit);
        }

        let score = self.inner.score(phrase).await?;
        self.cache.set(&key, score);
        Ok(score)
    }

    fn source_name(&self) -> &str {
        self.inner.source_name()
    }
}
