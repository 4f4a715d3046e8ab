// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process expiring key-value store.
//!
//! Used when no Redis URL is configured and in tests. Entries live in an LRU
//! bounded by capacity; each entry also carries its own deadline and is
//! dropped on the first read after it passes.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use super::{KvStore, StorageError, StorageResult};

/// Stored value + expiry deadline.
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// LRU-backed [`KvStore`] with per-entry TTL.
pub struct MemoryKvStore {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryKvStore {
    /// Create a store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, LruCache<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))
    }

    /// Number of entries currently held, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MEMORY_STORE_CAPACITY)
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.value.clone()));
            }
            // Expired; drop it
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        let mut entries = self.lock()?;
        entries.put(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> StorageResult<()> {
        self.lock()?.pop(key);
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        self.lock().map(|_| ())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let store = MemoryKvStore::new(10);
        assert!(store.get("k").await.unwrap().is_none());

        store
            .set_ex("k", b"value".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap().unwrap(), b"value");
    }

    #[tokio::test]
    async fn del_is_idempotent() {
        let store = MemoryKvStore::new(10);
        store
            .set_ex("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        store.del("k").await.unwrap();
        store.del("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_expire() {
        let store = MemoryKvStore::new(10);
        store
            .set_ex("k", b"v".to_vec(), Duration::from_millis(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = MemoryKvStore::new(2);
        let ttl = Duration::from_secs(60);
        store.set_ex("a", b"1".to_vec(), ttl).await.unwrap();
        store.set_ex("b", b"2".to_vec(), ttl).await.unwrap();
        // Touch "a" so "b" becomes the eviction candidate
        store.get("a").await.unwrap();
        store.set_ex("c", b"3".to_vec(), ttl).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_capacity_still_holds_one_entry() {
        let store = MemoryKvStore::new(0);
        store
            .set_ex("k", b"v".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
    }
}
