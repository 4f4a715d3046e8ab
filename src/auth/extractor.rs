// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for authenticated callers.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//!
//! async fn me(ActiveSession { user, session }: ActiveSession) -> impl IntoResponse {
//!     // the session behind the token still exists
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::bearer_token;
use super::session::{Session, SessionError};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated callers.
///
/// Reuses the identity placed in the extensions by the authorization
/// middleware; on routes without the middleware it verifies the bearer token
/// itself. Either way only the token is checked, not the session.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify_access(token)?;
        Ok(Auth(AuthenticatedUser::from_claims(claims)))
    }
}

/// Extractor that requires the admin role on a live session.
///
/// Resolves the session like [`ActiveSession`], so an admin token kept
/// after logout is rejected with 401 before the role is looked at.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ActiveSession { user, .. } = ActiveSession::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Authenticated caller whose session is still live.
///
/// Resolves the token's session id in the session store, so a token issued
/// before logout is rejected with 401 even while its signature and expiry
/// still verify.
pub struct ActiveSession {
    pub user: AuthenticatedUser,
    pub session: Session,
}

impl FromRequestParts<AppState> for ActiveSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        let session = state
            .sessions
            .get(&user.session_id)
            .await
            .map_err(|e| match e {
                SessionError::NotFound => AuthError::SessionRevoked,
                SessionError::Corrupt(e) => AuthError::InternalError(e.to_string()),
                SessionError::Storage(e) => AuthError::StoreUnavailable(e.to_string()),
            })?;

        if session.principal() != user.principal {
            tracing::warn!(
                principal = %user.principal,
                session_principal = %session.principal(),
                "token principal does not own its session"
            );
            return Err(AuthError::SessionRevoked);
        }

        Ok(ActiveSession { user, session })
    }
}
