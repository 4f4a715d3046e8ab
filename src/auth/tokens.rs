// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HS256 token pairs.
//!
//! ## Lifetimes
//!
//! - Access token: 15 minutes by default, carries session, principal and role
//! - Refresh token: 24 hours by default, carries the session id only
//!
//! Both are signed with the shared secret from [`AuthSettings`]. Verification
//! accepts HS256 only, applies no clock leeway and requires `exp`.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::claims::{AccessClaims, AccessClaimsWire, RefreshClaims};
use super::roles::Role;
use crate::config::AuthSettings;
use crate::models::{Principal, PrincipalRef};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    /// The header names an algorithm other than HS256
    #[error("token algorithm is not accepted")]
    InvalidAlgorithm,

    #[error("token is malformed")]
    Malformed,

    #[error("token is missing claim {0}")]
    MissingClaim(&'static str),

    #[error("token claim {0} is invalid")]
    InvalidClaim(&'static str),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::InvalidAlgorithm
            }
            ErrorKind::MissingRequiredClaim(_) => TokenError::MissingClaim("exp"),
            _ => TokenError::Malformed,
        }
    }
}

/// Access + refresh token returned at login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and verifies token pairs.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(&settings.jwt_secret),
            decoding: DecodingKey::from_secret(&settings.jwt_secret),
            validation,
            access_ttl: settings.access_token_ttl,
            refresh_ttl: settings.refresh_token_ttl,
        }
    }

    /// Issue a pair for `principal`, bound to `session_id`.
    pub fn issue_pair<P: Principal>(
        &self,
        principal: &P,
        session_id: &str,
    ) -> Result<TokenPair, TokenError> {
        self.issue_pair_for(principal.principal_ref(), principal.role(), session_id)
    }

    pub fn issue_pair_for(
        &self,
        principal: PrincipalRef,
        role: Role,
        session_id: &str,
    ) -> Result<TokenPair, TokenError> {
        let now = Utc::now().timestamp();

        let access = AccessClaims {
            session_id: session_id.to_string(),
            principal,
            role,
            exp: now + self.access_ttl.as_secs() as i64,
        };
        let refresh = RefreshClaims {
            session_id: session_id.to_string(),
            exp: now + self.refresh_ttl.as_secs() as i64,
        };

        Ok(TokenPair {
            access_token: self.sign(&AccessClaimsWire::from(&access))?,
            refresh_token: self.sign(&refresh)?,
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm and expiry, then decode typed claims.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaimsWire>(token, &self.decoding, &self.validation)?;
        AccessClaims::try_from(data.claims)
    }

    /// Same checks as [`verify_access`](Self::verify_access) for refresh tokens.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let data = decode::<RefreshClaims>(token, &self.decoding, &self.validation)?;
        if data.claims.session_id.is_empty() {
            return Err(TokenError::MissingClaim("session_id"));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::PrincipalKind;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use uuid::Uuid;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&Config::for_tests().auth)
    }

    fn patron() -> PrincipalRef {
        PrincipalRef {
            kind: PrincipalKind::User,
            id: Uuid::new_v4(),
        }
    }

    #[test]
    fn issued_access_token_verifies() {
        let issuer = issuer();
        let principal = patron();
        let pair = issuer.issue_pair_for(principal, Role::User, "session-1").unwrap();

        let claims = issuer.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.session_id, "session-1");
        assert_eq!(claims.principal, principal);
        assert_eq!(claims.role, Role::User);
        assert!(claims.exp > Utc::now().timestamp());

        let refresh = issuer.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.session_id, "session-1");
        assert!(refresh.exp > claims.exp);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let claims = AccessClaims {
            session_id: "s".to_string(),
            principal: patron(),
            role: Role::User,
            exp: Utc::now().timestamp() - 5,
        };
        let token = issuer.sign(&AccessClaimsWire::from(&claims)).unwrap();
        assert_eq!(issuer.verify_access(&token), Err(TokenError::Expired));

        let refresh = issuer
            .sign(&RefreshClaims {
                session_id: "s".to_string(),
                exp: Utc::now().timestamp() - 5,
            })
            .unwrap();
        assert_eq!(issuer.verify_refresh(&refresh), Err(TokenError::Expired));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let pair = issuer()
            .issue_pair_for(patron(), Role::User, "s")
            .unwrap();

        let mut settings = Config::for_tests().auth;
        settings.jwt_secret = b"another-secret-that-is-also-32-bytes!".to_vec();
        let other = TokenIssuer::new(&settings);
        assert_eq!(
            other.verify_access(&pair.access_token),
            Err(TokenError::InvalidSignature)
        );
        assert_eq!(
            other.verify_refresh(&pair.refresh_token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let issuer = issuer();
        let secret = Config::for_tests().auth.jwt_secret;
        let claims = AccessClaims {
            session_id: "s".to_string(),
            principal: patron(),
            role: Role::Admin,
            exp: Utc::now().timestamp() + 60,
        };
        let forged = encode(
            &Header::new(Algorithm::HS384),
            &AccessClaimsWire::from(&claims),
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();
        assert_eq!(issuer.verify_access(&forged), Err(TokenError::InvalidAlgorithm));

        let forged_refresh = encode(
            &Header::new(Algorithm::HS512),
            &RefreshClaims {
                session_id: "s".to_string(),
                exp: Utc::now().timestamp() + 60,
            },
            &EncodingKey::from_secret(&secret),
        )
        .unwrap();
        assert_eq!(
            issuer.verify_refresh(&forged_refresh),
            Err(TokenError::InvalidAlgorithm)
        );
    }

    #[test]
    fn unsigned_token_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            format!(
                r#"{{"session_id":"s","user_id":"{}","role":"admin","exp":{}}}"#,
                Uuid::new_v4(),
                Utc::now().timestamp() + 60
            )
            .as_bytes(),
        );
        let token = format!("{header}.{body}.");
        assert!(issuer().verify_access(&token).is_err());
        assert!(issuer().verify_refresh(&token).is_err());
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair_for(patron(), Role::User, "s").unwrap();

        assert!(issuer.verify_refresh(&pair.access_token).is_err());
        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(TokenError::MissingClaim(_))
        ));
    }

    #[test]
    fn missing_exp_is_rejected() {
        let issuer = issuer();
        let wire = AccessClaimsWire {
            session_id: Some("s".to_string()),
            user_id: Some(Uuid::new_v4().to_string()),
            role: Some("user".to_string()),
            ..Default::default()
        };
        let token = issuer.sign(&wire).unwrap();
        assert_eq!(
            issuer.verify_access(&token),
            Err(TokenError::MissingClaim("exp"))
        );
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(issuer().verify_access("not.a.jwt"), Err(TokenError::Malformed));
        assert_eq!(issuer().verify_access(""), Err(TokenError::Malformed));
    }
}
