// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session-backed token authentication for librarians and users.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email + password
//! 2. Server verifies the Argon2 hash, creates a session in the session store
//!    and returns an HS256 token pair bound to the session id
//! 3. Client sends `Authorization: Bearer <access token>`
//! 4. Server:
//!    - Verifies signature, algorithm and expiry (no leeway)
//!    - Extracts `session_id`, `librarian_id`/`user_id` and `role`
//!    - Checks the route's role requirement
//!    - Re-resolves the session on every authenticated route
//! 5. Client exchanges the refresh token for a new pair while the session
//!    lives; role is re-read from the credential store at that point
//!
//! ## Security
//!
//! - Logout deletes the session, which revokes every token bound to it
//! - Only HS256 is accepted, for both token types
//! - Passwords are never returned or logged

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod session;
pub mod tokens;

pub use claims::{AccessClaims, AuthenticatedUser, RefreshClaims};
pub use error::AuthError;
pub use extractor::{ActiveSession, AdminOnly, Auth};
pub use middleware::{authorize, RouteGate};
pub use password::{hash_password, verify_password, PasswordError};
pub use roles::{Access, Role};
pub use session::{Session, SessionError, SessionStore};
pub use tokens::{TokenError, TokenIssuer, TokenPair};
