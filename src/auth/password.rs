// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Argon2id password hashing.
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the salt and cost parameters travel with the hash and verification needs
//! no extra state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// Plaintext does not match the digest
    #[error("password does not match")]
    Mismatch,

    /// Stored digest is not a valid PHC string
    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash `plaintext` with a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `plaintext` against a stored digest.
pub fn verify_password(digest: &str, plaintext: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::MalformedHash)?;
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .map_err(|e| match e {
            argon2::password_hash::Error::Password => PasswordError::Mismatch,
            other => PasswordError::Hash(other.to_string()),
        })
}
