// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Service-level error taxonomy and its HTTP rendering.
//!
//! Use cases return [`ServiceError`]; handlers convert it into [`ApiError`]
//! with `?`. Storage failures are logged here with their detail and reach
//! the client only as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{PasswordError, SessionError, TokenError};
use crate::storage::StorageError;

/// Error kinds surfaced by the use-case layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input, rejected before any store access
    #[error("{0}")]
    Validation(String),

    /// Credential, session or entity absent
    #[error("{0} not found")]
    NotFound(String),

    /// Missing/invalid/expired token or unresolvable session
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not entitled
    #[error("{0}")]
    Forbidden(String),

    /// e.g. duplicate email on registration
    #[error("{0}")]
    Conflict(String),

    /// Primary store or network failure
    #[error(transparent)]
    Storage(StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ServiceError::NotFound(what),
            StorageError::AlreadyExists(what) => ServiceError::Conflict(format!("{what} already exists")),
            other => ServiceError::Storage(other),
        }
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => {
                ServiceError::Unauthorized("session expired or revoked".to_string())
            }
            SessionError::Corrupt(e) => ServiceError::Internal(format!("corrupt session: {e}")),
            SessionError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => ServiceError::Internal(msg),
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => {
                ServiceError::Unauthorized("invalid email or password".to_string())
            }
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::NotFound(what) => ApiError::not_found(format!("{what} not found")),
            ServiceError::Unauthorized(msg) => ApiError::unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::forbidden(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                ApiError::internal()
            }
            ServiceError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let conflict = ApiError::conflict("dup");
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("order".into()), StatusCode::NOT_FOUND),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ServiceError::Storage(StorageError::Unavailable("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn storage_not_found_becomes_not_found() {
        let err = ServiceError::from(StorageError::NotFound("librarian".into()));
        assert!(matches!(err, ServiceError::NotFound(ref what) if what == "librarian"));
    }

    #[test]
    fn auth_failures_are_unauthorized_not_storage() {
        assert!(matches!(
            ServiceError::from(SessionError::NotFound),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            ServiceError::from(PasswordError::Mismatch),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            ServiceError::from(TokenError::Expired),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            ServiceError::from(SessionError::Storage(StorageError::Timeout(
                std::time::Duration::from_secs(2)
            ))),
            ServiceError::Storage(_)
        ));
    }

    #[tokio::test]
    async fn storage_details_are_not_exposed() {
        let err = ServiceError::Storage(StorageError::Unavailable("redis://secret-host".into()));
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"internal server error"}"#);
    }
}
