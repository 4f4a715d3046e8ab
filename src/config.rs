// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! [`Config`] object built from them at startup. The configuration is
//! constructed once and handed to the token issuer, session store and caches
//! by reference; nothing here is mutable after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `JWT_SECRET` | HS256 signing secret (at least 32 bytes) | Required |
//! | `ACCESS_TOKEN_TTL_SECS` | Access token validity window | `900` |
//! | `REFRESH_TOKEN_TTL_SECS` | Refresh token validity window | `86400` |
//! | `SESSION_TTL_SECS` | Session store TTL | `86400` |
//! | `CACHE_TTL_SECS` | Entity cache TTL | `3600` |
//! | `REDIS_URL` | Redis URL for sessions and cache | In-process store |
//! | `STORE_TIMEOUT_MS` | Deadline for each store call | `2000` |
//! | `MEMORY_STORE_CAPACITY` | Entry capacity of the in-process entity cache | `100000` |
//! | `SESSION_STORE_CAPACITY` | Entry capacity of the in-process session store | `100000` |
//! | `ADMIN_EMAIL` | Bootstrap admin account email | Optional |
//! | `ADMIN_PASSWORD` | Bootstrap admin account password | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable holding the shared HS256 signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_SECS";
pub const REFRESH_TOKEN_TTL_ENV: &str = "REFRESH_TOKEN_TTL_SECS";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const CACHE_TTL_ENV: &str = "CACHE_TTL_SECS";

/// Environment variable for the Redis connection URL.
///
/// When unset, sessions and cached entities live in an in-process store and
/// do not survive a restart.
pub const REDIS_URL_ENV: &str = "REDIS_URL";

pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_MS";
pub const MEMORY_STORE_CAPACITY_ENV: &str = "MEMORY_STORE_CAPACITY";
pub const SESSION_STORE_CAPACITY_ENV: &str = "SESSION_STORE_CAPACITY";
pub const ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";
pub const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Access tokens are valid for 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh tokens are valid for 24 hours.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60;

/// Cached entity snapshots expire after one hour.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_MEMORY_STORE_CAPACITY: usize = 100_000;
pub const DEFAULT_SESSION_STORE_CAPACITY: usize = 100_000;

/// Minimum accepted length of the signing secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Errors raised while assembling the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{name} must be at least {min} bytes long")]
    SecretTooShort { name: &'static str, min: usize },

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Signing and lifetime settings for tokens and sessions.
#[derive(Clone)]
pub struct AuthSettings {
    /// Shared HS256 secret.
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub session_ttl: Duration,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("session_ttl", &self.session_ttl)
            .finish()
    }
}

/// Settings for the session/cache backing store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub redis_url: Option<String>,
    pub timeout: Duration,
    /// Capacity of the in-process entity cache
    pub memory_capacity: usize,
    /// Capacity of the in-process session store, kept apart from the cache
    pub session_capacity: usize,
    pub cache_ttl: Duration,
}

/// Credentials for the admin account created at startup.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub store: StoreSettings,
    pub admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                name: JWT_SECRET_ENV,
                min: MIN_SECRET_LEN,
            });
        }

        let admin = match (lookup(ADMIN_EMAIL_ENV), lookup(ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin { email, password })
            }
            _ => None,
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?,
            auth: AuthSettings {
                jwt_secret: secret.into_bytes(),
                access_token_ttl: secs(&lookup, ACCESS_TOKEN_TTL_ENV, DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
                refresh_token_ttl: secs(
                    &lookup,
                    REFRESH_TOKEN_TTL_ENV,
                    DEFAULT_REFRESH_TOKEN_TTL_SECS,
                )?,
                session_ttl: secs(&lookup, SESSION_TTL_ENV, DEFAULT_SESSION_TTL_SECS)?,
            },
            store: StoreSettings {
                redis_url: lookup(REDIS_URL_ENV).filter(|s| !s.is_empty()),
                timeout: Duration::from_millis(parse_or(
                    &lookup,
                    STORE_TIMEOUT_ENV,
                    DEFAULT_STORE_TIMEOUT_MS,
                )?),
                memory_capacity: parse_or(
                    &lookup,
                    MEMORY_STORE_CAPACITY_ENV,
                    DEFAULT_MEMORY_STORE_CAPACITY,
                )?,
                session_capacity: parse_or(
                    &lookup,
                    SESSION_STORE_CAPACITY_ENV,
                    DEFAULT_SESSION_STORE_CAPACITY,
                )?,
                cache_ttl: secs(&lookup, CACHE_TTL_ENV, DEFAULT_CACHE_TTL_SECS)?,
            },
            admin,
        })
    }

    /// Configuration used by tests: in-process store, default lifetimes.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth: AuthSettings {
                jwt_secret: b"test-secret-that-is-at-least-32-bytes!!".to_vec(),
                access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECS),
                refresh_token_ttl: Duration::from_secs(DEFAULT_REFRESH_TOKEN_TTL_SECS),
                session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            },
            store: StoreSettings {
                redis_url: None,
                timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
                memory_capacity: 1_000,
                session_capacity: 1_000,
                cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            },
            admin: None,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn secs<F>(lookup: &F, name: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: u64 = parse_or(lookup, name, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        });
    }
    Ok(Duration::from_secs(value))
}
