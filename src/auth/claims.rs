// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.
//!
//! Claims travel as flat JSON objects:
//!
//! ```text
//! access:  {"session_id": "...", "librarian_id" | "user_id": "...", "role": "...", "exp": 1700000000}
//! refresh: {"session_id": "...", "exp": 1700000000}
//! ```
//!
//! Decoding goes through a loosely typed wire struct first, then into the
//! typed claims. A missing or mistyped field rejects the whole token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::Role;
use super::tokens::TokenError;
use crate::models::{PrincipalKind, PrincipalRef};

/// Verified access token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub session_id: String,
    pub principal: PrincipalRef,
    pub role: Role,
    /// Unix timestamp (seconds)
    pub exp: i64,
}

/// Access claims as they appear in the token body.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct AccessClaimsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub librarian_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl From<&AccessClaims> for AccessClaimsWire {
    fn from(claims: &AccessClaims) -> Self {
        let id = Some(claims.principal.id.to_string());
        let (librarian_id, user_id) = match claims.principal.kind {
            PrincipalKind::Librarian => (id, None),
            PrincipalKind::User => (None, id),
        };
        Self {
            session_id: Some(claims.session_id.clone()),
            librarian_id,
            user_id,
            role: Some(claims.role.as_str().to_string()),
            exp: Some(claims.exp),
        }
    }
}

impl TryFrom<AccessClaimsWire> for AccessClaims {
    type Error = TokenError;

    fn try_from(wire: AccessClaimsWire) -> Result<Self, Self::Error> {
        let session_id = wire
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or(TokenError::MissingClaim("session_id"))?;

        let (kind, raw_id) = match (wire.librarian_id, wire.user_id) {
            (Some(id), None) => (PrincipalKind::Librarian, id),
            (None, Some(id)) => (PrincipalKind::User, id),
            (None, None) => return Err(TokenError::MissingClaim("principal id")),
            (Some(_), Some(_)) => return Err(TokenError::InvalidClaim("principal id")),
        };
        let id = Uuid::parse_str(&raw_id).map_err(|_| TokenError::InvalidClaim(kind.id_claim()))?;

        let role = wire.role.ok_or(TokenError::MissingClaim("role"))?;
        let role = Role::parse(&role).ok_or(TokenError::InvalidClaim("role"))?;
        if !role.fits(kind) {
            return Err(TokenError::InvalidClaim("role"));
        }

        Ok(Self {
            session_id,
            principal: PrincipalRef { kind, id },
            role,
            exp: wire.exp.ok_or(TokenError::MissingClaim("exp"))?,
        })
    }
}

/// Refresh token claims.
///
/// Carries no identity or role: both are re-resolved through the session
/// when the token is exchanged. Unknown fields are rejected so an access
/// token cannot be presented as a refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub session_id: String,
    pub exp: i64,
}

/// Caller identity established from a verified access token.
///
/// Inserted into request extensions by the authorization middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub principal: PrincipalRef,
    pub role: Role,
    pub session_id: String,
    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: AccessClaims) -> Self {
        Self {
            principal: claims.principal,
            role: claims.role,
            session_id: claims.session_id,
            expires_at: claims.exp,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether the caller is the principal `(kind, id)`.
    pub fn is_principal(&self, kind: PrincipalKind, id: Uuid) -> bool {
        self.principal.kind == kind && self.principal.id == id
    }

    /// Whether the caller may act on the principal `(kind, id)`.
    pub fn is_self_or_admin(&self, kind: PrincipalKind, id: Uuid) -> bool {
        self.is_admin() || self.is_principal(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(kind: PrincipalKind, role: &str) -> AccessClaimsWire {
        AccessClaimsWire::from(&AccessClaims {
            session_id: "s1".to_string(),
            principal: PrincipalRef {
                kind,
                id: Uuid::new_v4(),
            },
            role: Role::parse(role).unwrap(),
            exp: 1_900_000_000,
        })
    }

    #[test]
    fn wire_uses_kind_specific_id_claim() {
        let json = serde_json::to_value(wire(PrincipalKind::Librarian, "librarian")).unwrap();
        assert!(json.get("librarian_id").is_some());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["role"], "librarian");
        assert_eq!(json["session_id"], "s1");
    }

    #[test]
    fn round_trip_through_wire() {
        let w = wire(PrincipalKind::User, "admin");
        let id = w.user_id.clone().unwrap();
        let claims = AccessClaims::try_from(w).unwrap();
        assert_eq!(claims.principal.kind, PrincipalKind::User);
        assert_eq!(claims.principal.id.to_string(), id);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn missing_session_id_is_rejected() {
        let mut w = wire(PrincipalKind::User, "user");
        w.session_id = None;
        assert!(matches!(
            AccessClaims::try_from(w),
            Err(TokenError::MissingClaim("session_id"))
        ));
    }

    #[test]
    fn mistyped_fields_are_rejected() {
        let mut w = wire(PrincipalKind::User, "user");
        w.user_id = Some("not-a-uuid".to_string());
        assert!(matches!(
            AccessClaims::try_from(w),
            Err(TokenError::InvalidClaim(_))
        ));

        let mut w = wire(PrincipalKind::User, "user");
        w.role = Some("root".to_string());
        assert!(matches!(
            AccessClaims::try_from(w),
            Err(TokenError::InvalidClaim("role"))
        ));

        // A librarian id with a patron role
        let mut w = wire(PrincipalKind::Librarian, "librarian");
        w.role = Some("admin".to_string());
        assert!(AccessClaims::try_from(w).is_err());
    }

    #[test]
    fn ambiguous_principal_is_rejected() {
        let mut w = wire(PrincipalKind::User, "user");
        w.librarian_id = Some(Uuid::new_v4().to_string());
        assert!(matches!(
            AccessClaims::try_from(w),
            Err(TokenError::InvalidClaim("principal id"))
        ));
    }

    #[test]
    fn refresh_claims_reject_access_fields() {
        let json = r#"{"session_id":"s1","exp":1,"role":"admin"}"#;
        assert!(serde_json::from_str::<RefreshClaims>(json).is_err());
    }

    #[test]
    fn self_or_admin() {
        let id = Uuid::new_v4();
        let user = AuthenticatedUser {
            principal: PrincipalRef {
                kind: PrincipalKind::User,
                id,
            },
            role: Role::User,
            session_id: "s".to_string(),
            expires_at: 0,
        };
        assert!(user.is_self_or_admin(PrincipalKind::User, id));
        assert!(!user.is_self_or_admin(PrincipalKind::User, Uuid::new_v4()));
        // Same id under the other kind is a different principal
        assert!(!user.is_self_or_admin(PrincipalKind::Librarian, id));

        let admin = AuthenticatedUser {
            role: Role::Admin,
            ..user
        };
        assert!(admin.is_self_or_admin(PrincipalKind::Librarian, Uuid::new_v4()));
    }
}
