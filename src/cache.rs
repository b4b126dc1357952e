use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Key prefix for cached index pages. Entries are stored as `index_page:{page}`.
pub const INDEX_PAGE: &str = "index_page";

pub fn index_key(page: &str) -> String {
    format!("{}:{}", INDEX_PAGE, page)
}

/// Key/value cache for page data shared across requests.
#[async_trait]
pub trait PageCache<V>: Send + Sync {
    async fn get(&self, key: &str) -> Option<V>;

    async fn put(&self, key: String, value: V);

    /// Counter bumped by every invalidation. Read it before loading a value.
    async fn generation(&self) -> u64;

    /// Store `value` only if nothing was invalidated since `generation` was read.
    /// Returns whether it was stored.
    async fn put_if_current(&self, key: String, value: V, generation: u64) -> bool;

    async fn invalidate(&self, key: &str);

    /// Drop every entry whose key starts with `prefix`.
    async fn invalidate_prefix(&self, prefix: &str);
}

/// In-memory cache whose entries expire a fixed time after insertion.
pub struct TtlCache<V> {
    ttl: Duration,
    inner: Mutex<Inner<V>>,
}

struct Inner<V> {
    generation: u64,
    entries: HashMap<String, (Instant, V)>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }
}

impl<V> Inner<V> {
    fn insert(&mut self, ttl: Duration, key: String, value: V) {
        self.entries.retain(|_, (t, _)| t.elapsed() < ttl);
        self.entries.insert(key, (Instant::now(), value));
    }
}

#[async_trait]
impl<V> PageCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().await;
        match inner.entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: String, value: V) {
        self.inner.lock().await.insert(self.ttl, key, value);
    }

    async fn generation(&self) -> u64 {
        self.inner.lock().await.generation
    }

    async fn put_if_current(&self, key: String, value: V, generation: u64) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            return false;
        }
        inner.insert(self.ttl, key, value);
        true
    }

    async fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.entries.remove(key);
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.entries.retain(|key, _| !key.starts_with(prefix));
    }
}
