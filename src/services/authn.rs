// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, token issuance, refresh and logout.
//!
//! ## Session lifecycle
//!
//! ```text
//! login ──► session created ──► tokens usable ──► logout / TTL ──► gone
//!                                   │
//!                                   └─ refresh: session re-resolved, role re-read
//! ```
//!
//! Tokens are never stored. Deleting the session is what revokes them, so
//! every identity-sensitive path resolves the session again.

use super::AccountService;
use crate::auth::{verify_password, PasswordError, Session, TokenPair};
use crate::error::ServiceError;
use crate::models::{normalize_email, LoginRequest, Principal};
use crate::storage::CacheEntity;

const INVALID_CREDENTIALS: &str = "invalid email or password";

impl<P: Principal + CacheEntity> AccountService<P> {
    /// Verify credentials and open a session.
    ///
    /// Returns the principal without its password hash and the new session
    /// id. Unknown email and wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, request: LoginRequest) -> Result<(P, String), ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let principal = match self.credentials.repository().find_by_email(&email).await {
            Ok(principal) => principal,
            Err(e) if e.is_not_found() => {
                tracing::debug!(kind = %P::KIND, "login for unknown email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        verify_password(&principal.account().password_hash, &request.password).map_err(|e| {
            match e {
                PasswordError::Mismatch => {
                    tracing::debug!(kind = %P::KIND, id = %principal.id(), "wrong password")
                }
                ref other => tracing::error!(
                    kind = %P::KIND,
                    id = %principal.id(),
                    error = %other,
                    "stored password hash unusable"
                ),
            }
            ServiceError::from(e)
        })?;

        let session = Session::new(principal.principal_ref());
        let session_id = self
            .sessions
            .create(&session, self.sessions.default_ttl())
            .await?;

        tracing::info!(kind = %P::KIND, id = %principal.id(), "logged in");
        Ok((principal.sanitized(), session_id))
    }

    /// Mint an access + refresh token pair bound to `session_id`.
    pub fn generate_token_pair(
        &self,
        principal: &P,
        session_id: &str,
    ) -> Result<TokenPair, ServiceError> {
        Ok(self.tokens.issue_pair(principal, session_id)?)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The session must still exist and the principal's role is read from
    /// the credential store, not from the cache or the old token.
    pub async fn refresh_token_pair(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let session = self.sessions.get(&claims.session_id).await?;

        if session.principal_kind != P::KIND {
            tracing::debug!(
                expected = %P::KIND,
                found = %session.principal_kind,
                "refresh token presented to the wrong principal kind"
            );
            return Err(ServiceError::Unauthorized(
                "session does not belong to this account type".to_string(),
            ));
        }

        let principal = match self
            .credentials
            .repository()
            .find_by_id(session.principal_id)
            .await
        {
            Ok(principal) => principal,
            Err(e) if e.is_not_found() => {
                return Err(ServiceError::Unauthorized("account no longer exists".to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(kind = %P::KIND, id = %principal.id(), "token pair refreshed");
        Ok(self
            .tokens
            .issue_pair_for(principal.principal_ref(), principal.role(), &claims.session_id)?)
    }

    /// Delete the session. Logging out twice succeeds.
    pub async fn logout(&self, session_id: &str) -> Result<(), ServiceError> {
        self.sessions.delete(session_id).await?;
        tracing::info!(kind = %P::KIND, "logged out");
        Ok(())
    }

    /// The principal owning a resolved session.
    pub async fn me(&self, session: &Session) -> Result<P, ServiceError> {
        if session.principal_kind != P::KIND {
            return Err(ServiceError::Unauthorized(
                "session does not belong to this account type".to_string(),
            ));
        }
        self.cached_find_by_id(session.principal_id).await
    }

    /// Resolve `session_id`; a missing session is unauthorized.
    pub async fn session(&self, session_id: &str) -> Result<Session, ServiceError> {
        Ok(self.sessions.get(session_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::models::{RegisterRequest, UpdateAccountRequest, User};
    use crate::services::testing::Harness;
    use crate::storage::{CredentialStore, FindById};

    async fn registered(h: &Harness) -> User {
        h.users
            .register(RegisterRequest {
                email: "a@b.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap()
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn login_never_returns_the_hash() {
        let h = Harness::new();
        let user = registered(&h).await;

        let (principal, session_id) = h.users.login(login(" A@B.com", "secret1")).await.unwrap();
        assert_eq!(principal.user_id, user.user_id);
        assert!(principal.account.password_hash.is_empty());
        let json = serde_json::to_value(&principal).unwrap();
        assert!(json.get("password_hash").is_none());

        let session = h.sessions.get(&session_id).await.unwrap();
        assert_eq!(session.principal_id, user.user_id);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let h = Harness::new();
        registered(&h).await;

        let err = h.users.login(login("a@b.com", "secret2")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = h.users.login(login("x@b.com", "secret1")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn issued_pair_is_bound_to_the_session() {
        let h = Harness::new();
        registered(&h).await;
        let (user, session_id) = h.users.login(login("a@b.com", "secret1")).await.unwrap();

        let pair = h.users.generate_token_pair(&user, &session_id).unwrap();
        let claims = h.tokens.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.principal, user.principal_ref());
    }

    #[tokio::test]
    async fn refresh_fails_after_logout() {
        let h = Harness::new();
        registered(&h).await;
        let (user, session_id) = h.users.login(login("a@b.com", "secret1")).await.unwrap();
        let pair = h.users.generate_token_pair(&user, &session_id).unwrap();

        assert!(h.users.refresh_token_pair(&pair.refresh_token).await.is_ok());

        h.users.logout(&session_id).await.unwrap();
        h.users.logout(&session_id).await.unwrap();

        let err = h
            .users
            .refresh_token_pair(&pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn refresh_picks_up_role_changes() {
        let h = Harness::new();
        let user = registered(&h).await;
        let (user, session_id) = {
            let (u, s) = h.users.login(login("a@b.com", "secret1")).await.unwrap();
            assert_eq!(u.user_id, user.user_id);
            (u, s)
        };
        let pair = h.users.generate_token_pair(&user, &session_id).unwrap();
        // Warm the cache with the old role
        h.users.cached_find_by_id(user.user_id).await.unwrap();

        // Promote directly in the credential store
        let mut stored = h.user_store.find_by_id(user.user_id).await.unwrap();
        stored.account.role = Role::Admin;
        h.user_store.update(&stored).await.unwrap();

        let refreshed = h.users.refresh_token_pair(&pair.refresh_token).await.unwrap();
        let claims = h.tokens.verify_access(&refreshed.access_token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.session_id, session_id);
    }

    #[tokio::test]
    async fn refresh_rejects_other_kinds_and_deleted_accounts() {
        let h = Harness::new();
        let user = registered(&h).await;
        let (user, session_id) = {
            let (u, s) = h.users.login(login("a@b.com", "secret1")).await.unwrap();
            assert_eq!(u.user_id, user.user_id);
            (u, s)
        };
        let pair = h.users.generate_token_pair(&user, &session_id).unwrap();

        let err = h
            .librarians
            .refresh_token_pair(&pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        h.users.delete_by_id(user.user_id).await.unwrap();
        let err = h
            .users
            .refresh_token_pair(&pair.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn access_token_cannot_refresh() {
        let h = Harness::new();
        registered(&h).await;
        let (user, session_id) = h.users.login(login("a@b.com", "secret1")).await.unwrap();
        let pair = h.users.generate_token_pair(&user, &session_id).unwrap();

        let err = h
            .users
            .refresh_token_pair(&pair.access_token)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn me_follows_profile_updates() {
        let h = Harness::new();
        registered(&h).await;
        let (user, session_id) = h.users.login(login("a@b.com", "secret1")).await.unwrap();
        let session = h.users.session(&session_id).await.unwrap();

        assert_eq!(h.users.me(&session).await.unwrap().user_id, user.user_id);

        h.users
            .update_by_id(
                user.user_id,
                UpdateAccountRequest {
                    last_name: Some("Byron".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(h.users.me(&session).await.unwrap().account.last_name, "Byron");
        assert!(h.librarians.me(&session).await.is_err());
    }

    #[tokio::test]
    async fn password_change_takes_effect_on_next_login() {
        let h = Harness::new();
        let user = registered(&h).await;
        h.users
            .update_by_id(
                user.user_id,
                UpdateAccountRequest {
                    password: Some("secret2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(h.users.login(login("a@b.com", "secret1")).await.is_err());
        assert!(h.users.login(login("a@b.com", "secret2")).await.is_ok());
    }
}
