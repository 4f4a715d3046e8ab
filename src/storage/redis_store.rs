// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Redis-backed expiring key-value store.
//!
//! Every call is bounded by the configured store timeout. A call that times
//! out or cannot get a pooled connection fails with a [`StorageError`]; there
//! is no retry.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Connection, Pool, Runtime};
use redis::AsyncCommands;

use super::{KvStore, StorageError, StorageResult};

/// [`KvStore`] on a pooled Redis connection.
#[derive(Clone)]
pub struct RedisKvStore {
    pool: Pool,
    timeout: Duration,
}

impl RedisKvStore {
    /// Create a pool for `url` and verify that a connection can be obtained.
    pub async fn connect(url: &str, timeout: Duration) -> StorageResult<Self> {
        let mut config = PoolConfig::from_url(url);
        if let Some(ref mut pool_config) = config.pool {
            pool_config.timeouts.wait = Some(timeout);
            pool_config.timeouts.create = Some(timeout);
            pool_config.timeouts.recycle = Some(timeout);
        }

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let store = Self { pool, timeout };
        store.ping().await?;
        Ok(store)
    }

    async fn conn(&self) -> StorageResult<Connection> {
        self.bounded(async {
            self.pool
                .get()
                .await
                .map_err(|e| StorageError::Unavailable(e.to_string()))
        })
        .await
    }

    async fn bounded<T, F>(&self, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }
}

fn backend_error(e: redis::RedisError) -> StorageError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        StorageError::Unavailable(e.to_string())
    } else {
        StorageError::Backend(e.to_string())
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        self.bounded(async {
            conn.get::<_, Option<Vec<u8>>>(key)
                .await
                .map_err(backend_error)
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StorageResult<()> {
        let mut conn = self.conn().await?;
        // Redis rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        self.bounded(async {
            conn.set_ex::<_, _, ()>(key, value, seconds)
                .await
                .map_err(backend_error)
        })
        .await?;
        tracing::debug!(key = %key, ttl_secs = seconds, "store set");
        Ok(())
    }

    async fn del(&self, key: &str) -> StorageResult<()> {
        let mut conn = self.conn().await?;
        self.bounded(async { conn.del::<_, ()>(key).await.map_err(backend_error) })
            .await
    }

    async fn ping(&self) -> StorageResult<()> {
        let mut conn = self.conn().await?;
        self.bounded(async {
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
