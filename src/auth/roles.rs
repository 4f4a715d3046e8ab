// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Principal roles and per-route access requirements.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::PrincipalKind;

/// Principal roles for authorization.
///
/// ## Roles
///
/// - `Admin` - Manages librarian and user accounts
/// - `Librarian` - Library staff, accepts loan requests
/// - `User` - Patron, places loan requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access
    Admin,
    /// Library staff
    Librarian,
    /// Patron
    User,
}

impl Role {
    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "librarian" => Some(Role::Librarian),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::User => "user",
        }
    }

    /// Whether a principal of `kind` may hold this role.
    ///
    /// Librarians are always `librarian`; patron accounts are `user` or `admin`.
    pub fn fits(&self, kind: PrincipalKind) -> bool {
        matches!(
            (self, kind),
            (Role::Librarian, PrincipalKind::Librarian)
                | (Role::User | Role::Admin, PrincipalKind::User)
        )
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const LIBRARIAN_ONLY: &[Role] = &[Role::Librarian];
pub const USER_ONLY: &[Role] = &[Role::User];
pub const PATRON_OR_ADMIN: &[Role] = &[Role::User, Role::Admin];

/// What a route requires of the caller once the token has been verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any valid access token
    Authenticated,
    /// The token's role must be one of these
    AnyOf(&'static [Role]),
    /// The caller must be the principal of this kind named by the `{id}` path
    /// parameter, or an admin
    SelfOrAdmin(PrincipalKind),
}

impl Access {
    /// Role check only; ownership for [`Access::SelfOrAdmin`] is decided
    /// against the path by the middleware.
    pub fn permits_role(&self, role: Role) -> bool {
        match self {
            Access::Authenticated => true,
            Access::AnyOf(roles) => roles.contains(&role),
            Access::SelfOrAdmin(kind) => role == Role::Admin || role.fits(*kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("LIBRARIAN"), Some(Role::Librarian));
        assert_eq!(Role::parse("User"), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Librarian).unwrap(), "\"librarian\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn roles_fit_principal_kinds() {
        assert!(Role::Librarian.fits(PrincipalKind::Librarian));
        assert!(!Role::Librarian.fits(PrincipalKind::User));
        assert!(Role::Admin.fits(PrincipalKind::User));
        assert!(!Role::Admin.fits(PrincipalKind::Librarian));
        assert!(Role::User.fits(PrincipalKind::User));
    }

    #[test]
    fn any_of_is_exact_membership() {
        let access = Access::AnyOf(ADMIN_ONLY);
        assert!(access.permits_role(Role::Admin));
        assert!(!access.permits_role(Role::User));
        assert!(!access.permits_role(Role::Librarian));

        // Admins are not implicitly librarians
        assert!(!Access::AnyOf(LIBRARIAN_ONLY).permits_role(Role::Admin));
    }

    #[test]
    fn authenticated_permits_every_role() {
        for role in [Role::Admin, Role::Librarian, Role::User] {
            assert!(Access::Authenticated.permits_role(role));
        }
    }

    #[test]
    fn self_or_admin_role_precheck() {
        let access = Access::SelfOrAdmin(PrincipalKind::Librarian);
        assert!(access.permits_role(Role::Librarian));
        assert!(access.permits_role(Role::Admin));
        assert!(!access.permits_role(Role::User));
    }
}
