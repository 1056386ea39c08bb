use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Generic TTL cache wrapper using Moka
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

    /// Return the cached value or compute it. Errors are not cached.
    /// Concurrent misses for the same key share one computation.
    pub async fn get_or_try_insert<F, E>(&self, key: K, init: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.cache.try_get_with(key, init).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(cache: &AppCache<String, usize>, key: &str, calls: &AtomicUsize) -> usize {
        cache
            .get_or_try_insert(key.to_string(), async {
                Ok::<usize, String>(calls.fetch_add(1, Ordering::SeqCst) + 1)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_or_try_insert_reuses_value() {
        let cache = AppCache::new(100, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&cache, "key1", &calls).await, 1);
        assert_eq!(counted(&cache, "key1", &calls).await, 1);
        assert_eq!(counted(&cache, "key2", &calls).await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_skips_errors() {
        let cache: AppCache<String, u32> = AppCache::new(100, Duration::from_secs(60));

        let failed = cache
            .get_or_try_insert("k".to_string(), async { Err::<u32, String>("boom".into()) })
            .await;
        assert_eq!(failed.unwrap_err().as_str(), "boom");

        let value = cache
            .get_or_try_insert("k".to_string(), async { Ok::<u32, String>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);

        let cached = cache
            .get_or_try_insert("k".to_string(), async { Ok::<u32, String>(8) })
            .await
            .unwrap();
        assert_eq!(cached, 7);
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let cache = AppCache::new(100, Duration::from_millis(100));
        let calls = AtomicUsize::new(0);

        assert_eq!(counted(&cache, "key", &calls).await, 1);
        assert_eq!(counted(&cache, "key", &calls).await, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(counted(&cache, "key", &calls).await, 2);
    }
}
