// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account management for librarians and users.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{hash_password, Role, SessionStore, TokenIssuer};
use crate::config::BootstrapAdmin;
use crate::error::ServiceError;
use crate::models::{
    normalize_email, Account, Pagination, Principal, RegisterRequest, UpdateAccountRequest, User,
};
use crate::storage::{CacheEntity, CachedRepository, CredentialStore, EntityCache, KvStore};

/// Account and authentication use cases for one principal kind.
///
/// Every principal returned from here has its password hash cleared.
pub struct AccountService<P: Principal + CacheEntity> {
    pub(super) credentials: CachedRepository<P, dyn CredentialStore<P>>,
    pub(super) sessions: SessionStore,
    pub(super) tokens: Arc<TokenIssuer>,
}

impl<P: Principal + CacheEntity> AccountService<P> {
    pub fn new(
        store: Arc<dyn CredentialStore<P>>,
        cache: Arc<dyn KvStore>,
        cache_ttl: Duration,
        sessions: SessionStore,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            credentials: CachedRepository::new(store, EntityCache::new(cache, cache_ttl)),
            sessions,
            tokens,
        }
    }

    fn store(&self) -> &dyn CredentialStore<P> {
        self.credentials.repository()
    }

    /// Register a new principal with the kind's default role.
    pub async fn register(&self, request: RegisterRequest) -> Result<P, ServiceError> {
        self.create_with_role(request, P::DEFAULT_ROLE).await
    }

    pub(crate) async fn create_with_role(
        &self,
        request: RegisterRequest,
        role: Role,
    ) -> Result<P, ServiceError> {
        request.validate()?;
        if !role.fits(P::KIND) {
            return Err(ServiceError::Validation(format!(
                "role {role} is not valid for a {}",
                P::KIND
            )));
        }

        let now = Utc::now();
        let principal = P::from_account(
            Uuid::new_v4(),
            Account {
                email: normalize_email(&request.email),
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                avatar: None,
                password_hash: hash_password(&request.password)?,
                role,
                created_at: now,
                updated_at: now,
            },
        );

        self.store().create(&principal).await?;
        self.credentials.refresh(&principal).await;

        tracing::info!(kind = %P::KIND, id = %principal.id(), %role, "account created");
        Ok(principal.sanitized())
    }

    pub async fn find_all(&self, page: &Pagination) -> Result<Vec<P>, ServiceError> {
        let principals = self.store().find_all(page).await?;
        Ok(principals.into_iter().map(Principal::sanitized).collect())
    }

    /// Read from the primary store, bypassing the cache.
    pub async fn find_by_id(&self, id: Uuid) -> Result<P, ServiceError> {
        Ok(self.store().find_by_id(id).await?.sanitized())
    }

    pub async fn cached_find_by_id(&self, id: Uuid) -> Result<P, ServiceError> {
        Ok(self.credentials.cached_find_by_id(id).await?.sanitized())
    }

    /// Drop the cached snapshot of `id`.
    pub async fn invalidate(&self, id: Uuid) {
        self.credentials.invalidate(id).await;
    }

    /// Apply a partial profile update. A new password is re-hashed.
    pub async fn update_by_id(
        &self,
        id: Uuid,
        request: UpdateAccountRequest,
    ) -> Result<P, ServiceError> {
        request.validate()?;

        let mut principal = self.store().find_by_id(id).await?;
        let account = principal.account_mut();
        if let Some(first_name) = request.first_name {
            account.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            account.last_name = last_name.trim().to_string();
        }
        if let Some(avatar) = request.avatar {
            account.avatar = Some(avatar).filter(|a| !a.trim().is_empty());
        }
        if let Some(password) = request.password {
            account.password_hash = hash_password(&password)?;
        }
        account.updated_at = Utc::now();

        self.store().update(&principal).await?;
        self.credentials.refresh(&principal).await;

        tracing::info!(kind = %P::KIND, %id, "account updated");
        Ok(principal.sanitized())
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store().delete_by_id(id).await?;
        self.credentials.invalidate(id).await;

        tracing::info!(kind = %P::KIND, %id, "account deleted");
        Ok(())
    }
}

impl AccountService<User> {
    /// Create the configured admin account unless its email is taken.
    ///
    /// Returns `true` when an account was created.
    pub async fn bootstrap_admin(&self, admin: &BootstrapAdmin) -> Result<bool, ServiceError> {
        let email = normalize_email(&admin.email);
        match self.store().find_by_email(&email).await {
            Ok(existing) => {
                if existing.role() != Role::Admin {
                    tracing::warn!(
                        id = %existing.id(),
                        "bootstrap admin email belongs to a non-admin account"
                    );
                }
                return Ok(false);
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let request = RegisterRequest {
            email,
            first_name: "Admin".to_string(),
            last_name: "Admin".to_string(),
            password: admin.password.clone(),
        };
        self.create_with_role(request, Role::Admin).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::models::Librarian;
    use crate::services::testing::Harness;
    use crate::storage::FindById;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_and_hashes_password() {
        let h = Harness::new();
        let user = h.users.register(register_request("  A@B.com ")).await.unwrap();
        assert_eq!(user.email(), "a@b.com");
        assert_eq!(user.role(), Role::User);
        assert!(user.account.password_hash.is_empty());

        let stored = h.user_store.find_by_email("a@b.com").await.unwrap();
        assert!(verify_password(&stored.account.password_hash, "secret1").is_ok());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let h = Harness::new();
        h.users.register(register_request("a@b.com")).await.unwrap();
        let err = h.users.register(register_request("A@b.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_store() {
        let h = Harness::new();
        let err = h.users.register(register_request("nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(h.user_store.len().await, 0);
    }

    #[tokio::test]
    async fn librarians_get_the_librarian_role() {
        let h = Harness::new();
        let librarian: Librarian = h
            .librarians
            .register(register_request("lib@b.com"))
            .await
            .unwrap();
        assert_eq!(librarian.role(), Role::Librarian);

        let err = h
            .librarians
            .create_with_role(register_request("x@b.com"), Role::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn update_rehashes_password_and_refreshes_cache() {
        let h = Harness::new();
        let user = h.users.register(register_request("a@b.com")).await.unwrap();
        let old_hash = h
            .user_store
            .find_by_id(user.user_id)
            .await
            .unwrap()
            .account
            .password_hash;

        let updated = h
            .users
            .update_by_id(
                user.user_id,
                UpdateAccountRequest {
                    first_name: Some("Augusta".to_string()),
                    password: Some("secret2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.account.first_name, "Augusta");
        assert!(updated.account.password_hash.is_empty());

        let stored = h.user_store.find_by_id(user.user_id).await.unwrap();
        assert_ne!(stored.account.password_hash, old_hash);
        assert!(verify_password(&stored.account.password_hash, "secret2").is_ok());

        let cached = h.users.cached_find_by_id(user.user_id).await.unwrap();
        assert_eq!(cached.account.first_name, "Augusta");
    }

    #[tokio::test]
    async fn update_of_missing_account_is_not_found() {
        let h = Harness::new();
        let err = h
            .users
            .update_by_id(Uuid::new_v4(), UpdateAccountRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_invalidates_cache() {
        let h = Harness::new();
        let user = h.users.register(register_request("a@b.com")).await.unwrap();
        h.users.cached_find_by_id(user.user_id).await.unwrap();

        h.users.delete_by_id(user.user_id).await.unwrap();
        let err = h.users.cached_find_by_id(user.user_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_all_never_returns_hashes() {
        let h = Harness::new();
        for email in ["a@b.com", "c@d.com"] {
            h.users.register(register_request(email)).await.unwrap();
        }
        let all = h.users.find_all(&Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|u| u.account.password_hash.is_empty()));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let h = Harness::new();
        let admin = BootstrapAdmin {
            email: "Root@Library.test".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(h.users.bootstrap_admin(&admin).await.unwrap());
        assert!(!h.users.bootstrap_admin(&admin).await.unwrap());

        let stored = h.user_store.find_by_email("root@library.test").await.unwrap();
        assert_eq!(stored.role(), Role::Admin);
    }
}
