// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cache-aside reads for hot entities.
//!
//! [`CachedRepository`] wraps any repository that can find an entity by id.
//! Reads consult the cache first and fall through to the repository on a
//! miss, a cache error or an undecodable snapshot, writing the result back
//! afterwards. The cache is never authoritative:
//!
//! - a failed cache read is a miss
//! - a failed cache write or invalidation is logged and ignored
//! - callers update the primary store first and only then refresh or
//!   invalidate the cache entry
//!
//! Cache side effects return [`BestEffort`] so the decision to ignore a
//! failure is visible at the call site.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::repository::FindById;
use super::{KvStore, StorageError, StorageResult};
use crate::models::{Librarian, Order, Principal, User};

/// An entity that can be cached under `{CACHE_PREFIX}:{id}`.
pub trait CacheEntity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const CACHE_PREFIX: &'static str;

    fn cache_id(&self) -> Uuid;
}

impl CacheEntity for Librarian {
    const CACHE_PREFIX: &'static str = "librarian";

    fn cache_id(&self) -> Uuid {
        self.id()
    }
}

impl CacheEntity for User {
    const CACHE_PREFIX: &'static str = "user";

    fn cache_id(&self) -> Uuid {
        self.id()
    }
}

impl CacheEntity for Order {
    const CACHE_PREFIX: &'static str = "order";

    fn cache_id(&self) -> Uuid {
        self.order_id
    }
}

/// Failure of a cache-only operation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StorageError),

    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Outcome of a cache side effect that must not fail the caller.
#[must_use = "log or inspect the outcome of a best-effort cache operation"]
#[derive(Debug)]
pub struct BestEffort {
    operation: &'static str,
    key: String,
    outcome: Result<(), CacheError>,
}

impl BestEffort {
    fn new(operation: &'static str, key: String, outcome: Result<(), CacheError>) -> Self {
        Self {
            operation,
            key,
            outcome,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Log a failure at `warn` and discard it.
    pub fn log_failure(self) {
        if let Err(e) = self.outcome {
            tracing::warn!(
                operation = self.operation,
                key = %self.key,
                error = %e,
                "best-effort cache operation failed"
            );
        }
    }

    pub fn into_result(self) -> Result<(), CacheError> {
        self.outcome
    }
}

/// Typed view over a [`KvStore`] for one entity type.
pub struct EntityCache<T> {
    store: Arc<dyn KvStore>,
    ttl: Duration,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<T: CacheEntity> EntityCache<T> {
    pub fn new(store: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            _entity: PhantomData,
        }
    }

    pub fn key(id: Uuid) -> String {
        format!("{}:{}", T::CACHE_PREFIX, id)
    }

    /// Look up a snapshot. `Ok(None)` on a miss.
    pub async fn get(&self, id: Uuid) -> Result<Option<T>, CacheError> {
        match self.store.get(&Self::key(id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Write a snapshot with the configured TTL.
    pub async fn put(&self, entity: &T) -> BestEffort {
        let key = Self::key(entity.cache_id());
        let outcome = match serde_json::to_vec(entity) {
            Ok(bytes) => self
                .store
                .set_ex(&key, bytes, self.ttl)
                .await
                .map_err(CacheError::from),
            Err(e) => Err(CacheError::from(e)),
        };
        BestEffort::new("put", key, outcome)
    }

    /// Drop the snapshot for `id`.
    pub async fn invalidate(&self, id: Uuid) -> BestEffort {
        let key = Self::key(id);
        let outcome = self.store.del(&key).await.map_err(CacheError::from);
        BestEffort::new("invalidate", key, outcome)
    }
}

/// Cache-aside decorator over a repository.
pub struct CachedRepository<T, R: ?Sized> {
    repository: Arc<R>,
    cache: EntityCache<T>,
}

impl<T, R: ?Sized> Clone for CachedRepository<T, R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: self.cache.clone(),
        }
    }
}

impl<T, R> CachedRepository<T, R>
where
    T: CacheEntity,
    R: FindById<T> + ?Sized,
{
    pub fn new(repository: Arc<R>, cache: EntityCache<T>) -> Self {
        Self { repository, cache }
    }

    /// The wrapped source of truth, for reads that must bypass the cache and
    /// for writes.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &EntityCache<T> {
        &self.cache
    }

    /// Read through the cache.
    ///
    /// A repository failure is returned as-is and nothing is cached.
    pub async fn cached_find_by_id(&self, id: Uuid) -> StorageResult<T> {
        match self.cache.get(id).await {
            Ok(Some(entity)) => {
                tracing::debug!(prefix = T::CACHE_PREFIX, %id, "cache hit");
                return Ok(entity);
            }
            Ok(None) => tracing::debug!(prefix = T::CACHE_PREFIX, %id, "cache miss"),
            Err(e) => tracing::warn!(
                prefix = T::CACHE_PREFIX,
                %id,
                error = %e,
                "cache read failed, falling back to repository"
            ),
        }

        let entity = self.repository.find_by_id(id).await?;
        self.cache.put(&entity).await.log_failure();
        Ok(entity)
    }

    /// Replace the cached snapshot after a successful primary write.
    pub async fn refresh(&self, entity: &T) {
        self.cache.put(entity).await.log_failure();
    }

    /// Drop the cached snapshot after a successful primary update or delete.
    pub async fn invalidate(&self, id: Uuid) {
        self.cache.invalidate(id).await.log_failure();
    }
}
