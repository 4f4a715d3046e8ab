// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer over the primary datastore.
//!
//! The traits here are the seam between the use cases and whatever relational
//! store holds librarians, users and orders. The in-memory implementations
//! back development runs and tests.

use async_trait::async_trait;
use uuid::Uuid;

use super::StorageResult;
use crate::models::{Order, Pagination, Principal};

pub mod credentials;
pub mod orders;

pub use credentials::InMemoryCredentialStore;
pub use orders::InMemoryOrderRepository;

/// Lookup by primary key, the only read the cache-aside path needs.
#[async_trait]
pub trait FindById<T>: Send + Sync {
    /// Returns [`StorageError::NotFound`](super::StorageError::NotFound) when
    /// no row matches.
    async fn find_by_id(&self, id: Uuid) -> StorageResult<T>;
}

/// Credential store for one principal kind.
///
/// Emails are stored normalized and are unique per store.
#[async_trait]
pub trait CredentialStore<P: Principal>: FindById<P> {
    async fn find_by_email(&self, email: &str) -> StorageResult<P>;

    /// Fails with `AlreadyExists` when the email is taken.
    async fn create(&self, principal: &P) -> StorageResult<()>;

    /// Replace the stored record with the same id.
    async fn update(&self, principal: &P) -> StorageResult<()>;

    async fn delete_by_id(&self, id: Uuid) -> StorageResult<()>;

    /// One page, oldest first.
    async fn find_all(&self, page: &Pagination) -> StorageResult<Vec<P>>;
}

/// Loan request persistence.
#[async_trait]
pub trait OrderRepository: FindById<Order> {
    async fn create(&self, order: &Order) -> StorageResult<()>;

    async fn update(&self, order: &Order) -> StorageResult<()>;

    async fn find_all(&self, page: &Pagination) -> StorageResult<Vec<Order>>;

    async fn find_all_by_user_id(&self, user_id: Uuid, page: &Pagination)
        -> StorageResult<Vec<Order>>;
}
