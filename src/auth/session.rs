// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side login sessions.
//!
//! A session is created at login and destroyed at logout or when its TTL
//! runs out. It is never updated in place. Tokens only carry the session id,
//! so deleting the record revokes every token bound to it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::models::{PrincipalKind, PrincipalRef};
use crate::storage::{KvStore, StorageError};

/// Session payload as stored under its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub principal_id: Uuid,
    pub principal_kind: PrincipalKind,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(principal: PrincipalRef) -> Self {
        Self {
            principal_id: principal.id,
            principal_kind: principal.kind,
            created_at: Utc::now(),
        }
    }

    pub fn principal(&self) -> PrincipalRef {
        PrincipalRef {
            kind: self.principal_kind,
            id: self.principal_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Absent or expired. Callers treat this as an invalid session.
    #[error("session not found")]
    NotFound,

    #[error("session payload is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Session records over an expiring key-value store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KvStore>,
    default_ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KvStore>, settings: &AuthSettings) -> Self {
        Self {
            store,
            default_ttl: settings.session_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `session` under a fresh UUID v4 and return that id.
    pub async fn create(&self, session: &Session, ttl: Duration) -> Result<String, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_vec(session)?;
        self.store.set_ex(&session_id, payload, ttl).await?;
        tracing::debug!(principal = %session.principal(), "session created");
        Ok(session_id)
    }

    pub async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        match self.store.get(session_id).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Err(SessionError::NotFound),
        }
    }

    /// Remove the session. Deleting an absent session succeeds.
    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.store.del(session_id).await?;
        Ok(())
    }
}
