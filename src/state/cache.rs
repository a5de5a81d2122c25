use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
use crate::models::SearchResultPage;
use crate::search::CacheKey;
use moka::future::Cache;
use std::hash::Hash;
use std::time::Duration;

/// Generic cache wrapper using Moka
#[derive(Clone)]
pub struct AppCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, V>,
}

impl<K, V> AppCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    pub async fn invalidate(&self, key: &K) {
        self.cache.invalidate(key).await;
    }
}

/// Session-scoped page cache keyed by [`CacheKey`].
///
/// Each search screen owns its own instance, so independent screens (and
/// tests) never share entries.
#[derive(Clone)]
pub struct ResultCache {
    inner: AppCache<CacheKey, SearchResultPage>,
}

impl ResultCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            inner: AppCache::new(max_entries, ttl),
        }
    }

    /// Look up a page, recording the hit or miss
    pub async fn lookup(&self, key: &CacheKey) -> Option<SearchResultPage> {
        let page = self.inner.get(key).await;
        if page.is_some() {
            CACHE_HITS_TOTAL.inc();
            tracing::debug!(key = %key, "Result cache hit");
        } else {
            CACHE_MISSES_TOTAL.inc();
        }
        page
    }

    pub async fn store(&self, key: CacheKey, page: SearchResultPage) {
        self.inner.insert(key, page).await;
    }

    pub async fn evict(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
    }
}
