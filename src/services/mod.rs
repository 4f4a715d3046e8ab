// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Use-case layer.
//!
//! Handlers call into these services and convert the returned
//! [`ServiceError`](crate::error::ServiceError) into an HTTP response.
//! Reads by id go through the entity cache; writes hit the repository first
//! and refresh or invalidate the cache afterwards.

pub mod accounts;
pub mod authn;
pub mod orders;

pub use accounts::AccountService;
pub use orders::OrderService;
