// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::tokens::TokenError;

/// Authentication and authorization failure.
///
/// Every variant except the last two ends the request before the handler
/// runs. 401 means the caller is not (or no longer) authenticated, 403 means
/// they are authenticated but not entitled.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Token is malformed or carries missing/mistyped claims
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token header names an algorithm other than the expected one
    InvalidAlgorithm,
    /// Token has expired
    TokenExpired,
    /// Session behind the token was logged out or has expired
    SessionRevoked,
    /// Role does not satisfy the route
    InsufficientPermissions,
    /// Caller is neither the addressed principal nor an admin
    NotResourceOwner,
    /// Session store could not be reached
    StoreUnavailable(String),
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidAlgorithm => "invalid_algorithm",
            AuthError::TokenExpired => "token_expired",
            AuthError::SessionRevoked => "session_revoked",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::NotResourceOwner => "not_resource_owner",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::InvalidAlgorithm
            | AuthError::TokenExpired
            | AuthError::SessionRevoked => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions | AuthError::NotResourceOwner => {
                StatusCode::FORBIDDEN
            }
            AuthError::StoreUnavailable(_) | AuthError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::InvalidAlgorithm => write!(f, "Token algorithm is not accepted"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::SessionRevoked => write!(f, "Session has ended, please log in again"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::NotResourceOwner => {
                write!(f, "You may only act on your own account")
            }
            // Details stay in the logs
            AuthError::StoreUnavailable(_) => write!(f, "Session store unavailable"),
            AuthError::InternalError(_) => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::InvalidAlgorithm => AuthError::InvalidAlgorithm,
            TokenError::Malformed | TokenError::MissingClaim(_) | TokenError::InvalidClaim(_) => {
                AuthError::MalformedToken
            }
            TokenError::Signing(msg) => AuthError::InternalError(msg),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AuthError::StoreUnavailable(detail) | AuthError::InternalError(detail) => {
                tracing::error!(error_code = self.error_code(), %detail, "authentication failed");
            }
            _ => tracing::debug!(error_code = self.error_code(), "request rejected"),
        }
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
