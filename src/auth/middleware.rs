// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-route authorization gate.
//!
//! Each protected route is wrapped with [`authorize`] and a [`RouteGate`]
//! describing what it requires:
//!
//! ```rust,ignore
//! let gate = RouteGate::new(tokens.clone(), Access::AnyOf(ADMIN_ONLY));
//! let route = get(list_users).layer(axum::middleware::from_fn_with_state(gate, authorize));
//! ```
//!
//! A request goes through these stages, stopping at the first failure:
//!
//! 1. bearer token present and well-formed, else 401
//! 2. signature, algorithm and expiry verified, typed claims decoded, else 401
//! 3. role checked against the route, else 403
//! 4. for self-or-admin routes, the `{id}` path parameter compared with the
//!    caller, else 403
//!
//! On success the [`AuthenticatedUser`] is placed in the request extensions
//! for the [`Auth`](super::Auth) extractor. Session revocation is checked
//! later, by the handler extractors that resolve the session.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use super::roles::Access;
use super::tokens::TokenIssuer;
use super::{AuthError, AuthenticatedUser};
use crate::models::PrincipalKind;

/// Path parameter naming the addressed principal on self-or-admin routes.
const ID_PARAM: &str = "id";

/// What one route requires, plus the verifier to check it with.
#[derive(Clone)]
pub struct RouteGate {
    tokens: Arc<TokenIssuer>,
    access: Access,
}

impl RouteGate {
    pub fn new(tokens: Arc<TokenIssuer>, access: Access) -> Self {
        Self { tokens, access }
    }

    async fn check(&self, parts: &mut Parts) -> Result<AuthenticatedUser, AuthError> {
        let token = bearer_token(&parts.headers)?;
        let claims = self.tokens.verify_access(token).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            AuthError::from(e)
        })?;
        let user = AuthenticatedUser::from_claims(claims);

        if !self.access.permits_role(user.role) {
            tracing::debug!(
                principal = %user.principal,
                role = %user.role,
                "role not permitted on route"
            );
            return Err(AuthError::InsufficientPermissions);
        }

        if let Access::SelfOrAdmin(kind) = self.access {
            if !user.is_admin() {
                ensure_self(&user, kind, parts).await?;
            }
        }

        Ok(user)
    }
}

/// Authorization middleware function.
pub async fn authorize(State(gate): State<RouteGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    match gate.check(&mut parts).await {
        Ok(user) => {
            parts.extensions.insert(user);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}

async fn ensure_self(
    user: &AuthenticatedUser,
    kind: PrincipalKind,
    parts: &mut Parts,
) -> Result<(), AuthError> {
    let params = RawPathParams::from_request_parts(parts, &())
        .await
        .map_err(|e| AuthError::InternalError(format!("self-or-admin route without path: {e}")))?;
    let raw = params
        .iter()
        .find_map(|(name, value)| (name == ID_PARAM).then_some(value))
        .ok_or_else(|| AuthError::InternalError("self-or-admin route without {id}".to_string()))?;

    // An unparsable id cannot name the caller
    match Uuid::parse_str(raw) {
        Ok(id) if user.is_principal(kind, id) => Ok(()),
        _ => {
            tracing::debug!(principal = %user.principal, target = raw, "not resource owner");
            Err(AuthError::NotResourceOwner)
        }
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}
