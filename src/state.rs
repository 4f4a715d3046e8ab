// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{SessionStore, TokenIssuer};
use crate::config::{Config, StoreSettings};
use crate::models::{Librarian, User};
use crate::services::{AccountService, OrderService};
use crate::storage::{
    CredentialStore, InMemoryCredentialStore, InMemoryOrderRepository, KvStore, MemoryKvStore,
    OrderRepository,
};

/// Primary-store repositories the services are built over.
pub struct Repositories {
    pub librarians: Arc<dyn CredentialStore<Librarian>>,
    pub users: Arc<dyn CredentialStore<User>>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            librarians: Arc::new(InMemoryCredentialStore::<Librarian>::new()),
            users: Arc::new(InMemoryCredentialStore::<User>::new()),
            orders: Arc::new(InMemoryOrderRepository::new()),
        }
    }
}

/// Expiring key-value stores.
///
/// Sessions get their own store so that cache writes can never evict them.
pub struct KvStores {
    pub sessions: Arc<dyn KvStore>,
    pub cache: Arc<dyn KvStore>,
}

impl KvStores {
    pub fn in_memory(settings: &StoreSettings) -> Self {
        Self {
            sessions: Arc::new(MemoryKvStore::new(settings.session_capacity)),
            cache: Arc::new(MemoryKvStore::new(settings.memory_capacity)),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Backend of the session store
    pub session_store: Arc<dyn KvStore>,
    /// Backend of the entity cache
    pub cache_store: Arc<dyn KvStore>,
    pub tokens: Arc<TokenIssuer>,
    pub sessions: SessionStore,
    pub librarians: Arc<AccountService<Librarian>>,
    pub users: Arc<AccountService<User>>,
    pub orders: Arc<OrderService>,
}

impl AppState {
    pub fn new(config: Config, stores: KvStores, repositories: Repositories) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.auth));
        let sessions = SessionStore::new(stores.sessions.clone(), &config.auth);
        let cache = stores.cache;
        let cache_ttl = config.store.cache_ttl;

        let librarians = AccountService::new(
            repositories.librarians,
            cache.clone(),
            cache_ttl,
            sessions.clone(),
            tokens.clone(),
        );
        let users = AccountService::new(
            repositories.users,
            cache.clone(),
            cache_ttl,
            sessions.clone(),
            tokens.clone(),
        );
        let orders = OrderService::new(repositories.orders, cache.clone(), cache_ttl);

        Self {
            config: Arc::new(config),
            session_store: stores.sessions,
            cache_store: cache,
            tokens,
            sessions,
            librarians: Arc::new(librarians),
            users: Arc::new(users),
            orders: Arc::new(orders),
        }
    }

    /// Everything in process memory.
    pub fn in_memory(config: Config) -> Self {
        let stores = KvStores::in_memory(&config.store);
        Self::new(config, stores, Repositories::in_memory())
    }
}
