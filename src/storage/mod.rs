// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Two kinds of storage back the service:
//!
//! - An **expiring key-value store** ([`KvStore`]) holding login sessions and
//!   cached entity snapshots. It is either Redis ([`RedisKvStore`]) or an
//!   in-process LRU ([`MemoryKvStore`]). Every entry carries a TTL enforced by
//!   the store itself.
//! - **Repositories** ([`repository`]) over the primary datastore for
//!   librarians, users and orders.
//!
//! The cache-aside read path in [`cache`] composes the two.
//!
//! ## Key Layout
//!
//! ```text
//! {session_id}          -> {"principal_id": ..., "principal_kind": ..., "created_at": ...}
//! librarian:{uuid}      -> cached Librarian snapshot
//! user:{uuid}           -> cached User snapshot
//! order:{uuid}          -> cached Order snapshot
//! ```
//!
//! Consistency is per key: callers never lock around store operations.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod memory;
pub mod redis_store;
pub mod repository;

pub use cache::{BestEffort, CacheEntity, CacheError, CachedRepository, EntityCache};
pub use memory::MemoryKvStore;
pub use redis_store::RedisKvStore;
pub use repository::{
    CredentialStore, FindById, InMemoryCredentialStore, InMemoryOrderRepository, OrderRepository,
};

/// Error type for store and repository operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Row or key absent. An expected outcome, not a failure of the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unique constraint violated
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Backend unreachable or connection pool exhausted
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend returned an error
    #[error("store error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether this is the "no rows" condition rather than a store failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// An expiring key-value store.
///
/// Implementations must be safe to share between concurrent requests; each
/// operation is atomic per key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value under `key`. Absent and expired keys yield `Ok(None)`.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StorageResult<()>;

    /// Remove `key`. Removing an absent key succeeds.
    async fn del(&self, key: &str) -> StorageResult<()>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> StorageResult<()>;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
