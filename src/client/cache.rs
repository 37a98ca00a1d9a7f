//! Query cache with a stale time.
//!
//! Values are kept as JSON so one cache serves every query type. A value
//! younger than the stale time is served without a request. Concurrent
//! fetches of the same key wait on a per-key lock so only one of them
//! reaches the server.

use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default stale time for list and detail queries
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Identifies a query: request path plus its parameters, sorted by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self.params.sort();
        self
    }

    /// Add `name` only when a value is given
    pub fn param_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: Instant,
}

pub struct QueryCache {
    stale_time: Duration,
    entries: DashMap<QueryKey, CacheEntry>,
    locks: DashMap<QueryKey, Arc<Mutex<()>>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// Cached value of `key` if it is not stale yet
    pub fn fresh(&self, key: &QueryKey) -> Option<Value> {
        self.entries
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.stale_time)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: QueryKey, value: Value) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Serve `key` from the cache or run `fetch` and store its result.
    /// Errors are returned as-is and never cached.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.fresh(key) {
            tracing::trace!(key = %key, "Query cache hit");
            return Ok(value);
        }

        let lock = self.locks.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;

            // Another caller may have filled the entry while we waited
            match self.fresh(key) {
                Some(value) => Ok(value),
                None => {
                    tracing::debug!(key = %key, "Query cache miss");
                    let result = fetch().await;
                    if let Ok(value) = &result {
                        self.insert(key.clone(), value.clone());
                    }
                    result
                }
            }
        };

        // Only the map still holds the lock once no caller is waiting on it
        drop(lock);
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    pub fn invalidate(&self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// Drop every entry whose path starts with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.path.starts_with(prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_query_key_params_are_sorted() {
        let a = QueryKey::new("/api/projects").param("limit", 6).param("category", "ai-automation");
        let b = QueryKey::new("/api/projects").param("category", "ai-automation").param("limit", 6);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/api/projects?category=ai-automation&limit=6");
        assert_eq!(
            QueryKey::new("/api/blogs").param_opt::<u32>("limit", None).to_string(),
            "/api/blogs"
        );
    }

    #[tokio::test]
    async fn test_fresh_values_are_served_from_cache() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = QueryKey::new("/api/blogs");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch::<(), _, _>(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!(["a"]))
                })
                .await
                .unwrap();
            assert_eq!(value, json!(["a"]));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_values_are_refetched() {
        let cache = QueryCache::new(Duration::ZERO);
        let key = QueryKey::new("/api/pricing");
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .get_or_fetch::<(), _, _>(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::Null)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = QueryCache::default();
        let key = QueryKey::new("/api/settings");
        let result = cache
            .get_or_fetch(&key, || async { Err::<Value, _>("down") })
            .await;
        assert_eq!(result, Err("down"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_are_coalesced() {
        let cache = Arc::new(QueryCache::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("/api/projects");

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let calls = calls.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch::<(), _, _>(&key, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(json!(1))
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), json!(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.locks.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_locks_are_released() {
        let cache = QueryCache::new(Duration::ZERO);
        for slug in ["atlas", "beacon", "cobalt"] {
            let key = QueryKey::new(format!("/api/projects/{}", slug));
            cache
                .get_or_fetch::<(), _, _>(&key, || async { Ok(json!({})) })
                .await
                .unwrap();
        }
        let failing = QueryKey::new("/api/settings");
        let _ = cache
            .get_or_fetch(&failing, || async { Err::<Value, _>("down") })
            .await;
        assert!(cache.locks.is_empty());
    }

    #[test]
    fn test_invalidate_prefix() {
        let cache = QueryCache::default();
        cache.insert(QueryKey::new("/api/projects"), json!([]));
        cache.insert(QueryKey::new("/api/projects/atlas"), json!({}));
        cache.insert(QueryKey::new("/api/blogs"), json!([]));

        cache.invalidate_prefix("/api/projects");
        assert_eq!(cache.len(), 1);
        assert!(cache.fresh(&QueryKey::new("/api/blogs")).is_some());

        cache.invalidate(&QueryKey::new("/api/blogs"));
        assert!(cache.is_empty());
    }
}
