// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, FindById};
use crate::models::{Pagination, Principal};
use crate::storage::{StorageError, StorageResult};

/// Credential store held in process memory, keyed by principal id.
pub struct InMemoryCredentialStore<P> {
    rows: RwLock<HashMap<Uuid, P>>,
}

impl<P> Default for InMemoryCredentialStore<P> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<P: Principal> InMemoryCredentialStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    fn not_found(id: impl std::fmt::Display) -> StorageError {
        StorageError::NotFound(format!("{} {id}", P::KIND))
    }
}

#[async_trait]
impl<P: Principal> FindById<P> for InMemoryCredentialStore<P> {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<P> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl<P: Principal> CredentialStore<P> for InMemoryCredentialStore<P> {
    async fn find_by_email(&self, email: &str) -> StorageResult<P> {
        self.rows
            .read()
            .await
            .values()
            .find(|p| p.email() == email)
            .cloned()
            .ok_or_else(|| Self::not_found(email))
    }

    async fn create(&self, principal: &P) -> StorageResult<()> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&principal.id()) || rows.values().any(|p| p.email() == principal.email())
        {
            return Err(StorageError::AlreadyExists(format!(
                "{} {}",
                P::KIND,
                principal.email()
            )));
        }
        rows.insert(principal.id(), principal.clone());
        Ok(())
    }

    async fn update(&self, principal: &P) -> StorageResult<()> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&principal.id()) {
            Some(row) => {
                *row = principal.clone();
                Ok(())
            }
            None => Err(Self::not_found(principal.id())),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> StorageResult<()> {
        self.rows
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }

    async fn find_all(&self, page: &Pagination) -> StorageResult<Vec<P>> {
        let rows = self.rows.read().await;
        let mut all: Vec<&P> = rows.values().collect();
        all.sort_by_key(|p| (p.account().created_at, p.id()));
        Ok(all
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::models::{Account, Librarian};
    use chrono::{Duration, Utc};

    fn librarian(email: &str, age_secs: i64) -> Librarian {
        let created = Utc::now() - Duration::seconds(age_secs);
        Librarian::from_account(
            Uuid::new_v4(),
            Account {
                email: email.to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                avatar: None,
                password_hash: "hash".to_string(),
                role: Role::Librarian,
                created_at: created,
                updated_at: created,
            },
        )
    }

    #[tokio::test]
    async fn create_and_find() {
        let store = InMemoryCredentialStore::<Librarian>::new();
        let l = librarian("ada@lib.test", 0);
        store.create(&l).await.unwrap();

        assert_eq!(store.find_by_id(l.librarian_id).await.unwrap(), l);
        assert_eq!(store.find_by_email("ada@lib.test").await.unwrap(), l);
        assert!(store
            .find_by_email("nobody@lib.test")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryCredentialStore::<Librarian>::new();
        store.create(&librarian("ada@lib.test", 0)).await.unwrap();
        let err = store.create(&librarian("ada@lib.test", 0)).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_row() {
        let store = InMemoryCredentialStore::<Librarian>::new();
        let mut l = librarian("ada@lib.test", 0);
        assert!(store.update(&l).await.unwrap_err().is_not_found());

        store.create(&l).await.unwrap();
        l.account.first_name = "Augusta".to_string();
        store.update(&l).await.unwrap();
        assert_eq!(
            store.find_by_id(l.librarian_id).await.unwrap().account.first_name,
            "Augusta"
        );

        store.delete_by_id(l.librarian_id).await.unwrap();
        assert!(store.delete_by_id(l.librarian_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn find_all_pages_oldest_first() {
        let store = InMemoryCredentialStore::<Librarian>::new();
        for (i, email) in ["a@l.test", "b@l.test", "c@l.test"].iter().enumerate() {
            store.create(&librarian(email, 100 - i as i64)).await.unwrap();
        }

        let first = store.find_all(&Pagination { page: 1, size: 2 }).await.unwrap();
        assert_eq!(
            first.iter().map(|l| l.email()).collect::<Vec<_>>(),
            ["a@l.test", "b@l.test"]
        );
        let second = store.find_all(&Pagination { page: 2, size: 2 }).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].email(), "c@l.test");
    }
}
