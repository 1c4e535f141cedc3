use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use super::types::QueryKey;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    /// 已失效，下次读取需要重新拉取
    pub stale: bool,
}

struct Entries<T> {
    entries: HashMap<QueryKey, CacheEntry<T>>,
    /// 每次失效加一，包括尚无数据的 key
    generations: HashMap<QueryKey, u64>,
}

/// In-memory query cache keyed by query identity.
///
/// Entries live as long as the cache. `invalidate` marks an entry stale,
/// bumps the key's generation and broadcasts the key so active readers can
/// refetch. Data fetched before the latest invalidation is stored stale.
pub struct QueryCache<T> {
    inner: RwLock<Entries<T>>,
    invalidation_tx: broadcast::Sender<QueryKey>,
}

impl<T: Clone> QueryCache<T> {
    pub fn new() -> Self {
        let (invalidation_tx, _) = broadcast::channel(16);

        Self {
            inner: RwLock::new(Entries {
                entries: HashMap::new(),
                generations: HashMap::new(),
            }),
            invalidation_tx,
        }
    }

    pub async fn get(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.inner.read().await.entries.get(key).cloned()
    }

    /// 只返回未失效的数据
    pub async fn get_fresh(&self, key: &QueryKey) -> Option<T> {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.data.clone())
    }

    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        self.inner
            .read()
            .await
            .entries
            .get(key)
            .map_or(true, |entry| entry.stale)
    }

    /// Current generation of `key`. Take it before starting a fetch and pass
    /// it to [`QueryCache::set_fetched`].
    pub async fn generation(&self, key: &QueryKey) -> u64 {
        self.inner
            .read()
            .await
            .generations
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, key: QueryKey, data: T) {
        self.inner.write().await.entries.insert(key, CacheEntry {
            data,
            stale: false,
        });
    }

    /// Store data fetched at `generation`. When `key` was invalidated since,
    /// the data is kept but stays stale. Returns whether it was stored fresh.
    pub async fn set_fetched(&self, key: QueryKey, data: T, generation: u64) -> bool {
        let mut inner = self.inner.write().await;
        let current = inner.generations.get(&key).copied().unwrap_or_default();
        let fresh = current == generation;
        if !fresh {
            tracing::debug!(key = %key, generation, current, "fetched data outdated by invalidation");
        }

        inner.entries.insert(key, CacheEntry {
            data,
            stale: !fresh,
        });

        fresh
    }

    /// Mutate an existing entry in place. Returns false when the key is absent.
    /// The stale flag is left untouched.
    pub async fn update<F>(&self, key: &QueryKey, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.inner.write().await.entries.get_mut(key) {
            Some(entry) => {
                f(&mut entry.data);
                true
            }
            None => false,
        }
    }

    /// Mark `key` stale and notify subscribers. Returns whether an entry existed.
    pub async fn mark_stale(&self, key: &QueryKey) -> bool {
        let existed = {
            let mut inner = self.inner.write().await;
            *inner.generations.entry(key.clone()).or_default() += 1;

            match inner.entries.get_mut(key) {
                Some(entry) => {
                    entry.stale = true;
                    true
                }
                None => false,
            }
        };

        tracing::debug!(key = %key, existed, "query invalidated");
        // 没有订阅者时发送失败，忽略
        let _ = self.invalidation_tx.send(key.clone());

        existed
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.invalidation_tx.subscribe()
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Invalidation seam used by mutations, independent of the cached type
#[async_trait]
pub trait Invalidate: Send + Sync {
    async fn invalidate(&self, key: &QueryKey) -> bool;
}

#[async_trait]
impl<T: Clone + Send + Sync> Invalidate for QueryCache<T> {
    async fn invalidate(&self, key: &QueryKey) -> bool {
        self.mark_stale(key).await
    }
}
