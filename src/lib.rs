// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Lending Server - library loan request backend
//!
//! Librarians and users log in with email and password and receive a
//! short-lived access token and a longer-lived refresh token, both bound to a
//! server-side session. Users place loan requests; librarians accept them.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Password hashing, sessions, tokens and route authorization
//! - `services` - Account, authentication and order use cases
//! - `storage` - Session/cache store backends, entity cache and repositories

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
