// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain and API Data Models
//!
//! This module defines the records held by the repositories (librarians,
//! users, orders) and the request structures accepted by the REST API.
//!
//! ## Principals
//!
//! Librarians and users are both *principals*: they log in with an email and
//! password and receive a token pair. The shared fields live in [`Account`];
//! the [`Principal`] trait lets the account and authentication services work
//! over either kind.
//!
//! The password hash is never serialized. A principal that went through
//! serde (API response, cache snapshot) always has an empty hash.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::Role;
use crate::error::ServiceError;

pub const MAX_EMAIL_LEN: usize = 60;
pub const MAX_NAME_LEN: usize = 30;

// =============================================================================
// Principals
// =============================================================================

/// Which credential store a principal lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Librarian,
    User,
}

impl PrincipalKind {
    /// Claim name carrying the principal id in access tokens.
    pub fn id_claim(&self) -> &'static str {
        match self {
            PrincipalKind::Librarian => "librarian_id",
            PrincipalKind::User => "user_id",
        }
    }
}

impl std::fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalKind::Librarian => f.write_str("librarian"),
            PrincipalKind::User => f.write_str("user"),
        }
    }
}

/// Reference to a principal: kind + id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: Uuid,
}

impl std::fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Fields shared by every principal record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    /// Trimmed, lower-cased, unique per credential store
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Library staff member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Librarian {
    pub librarian_id: Uuid,
    #[serde(flatten)]
    pub account: Account,
}

/// Patron (or admin) account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub account: Account,
}

/// A record that can authenticate.
pub trait Principal: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: PrincipalKind;

    /// Role given to accounts created through registration.
    const DEFAULT_ROLE: Role;

    fn from_account(id: Uuid, account: Account) -> Self;
    fn id(&self) -> Uuid;
    fn account(&self) -> &Account;
    fn account_mut(&mut self) -> &mut Account;

    fn principal_ref(&self) -> PrincipalRef {
        PrincipalRef {
            kind: Self::KIND,
            id: self.id(),
        }
    }

    fn email(&self) -> &str {
        &self.account().email
    }

    fn role(&self) -> Role {
        self.account().role
    }

    /// Clear the password hash before the record leaves the service layer.
    fn sanitize_password(&mut self) {
        self.account_mut().password_hash.clear();
    }

    fn sanitized(mut self) -> Self {
        self.sanitize_password();
        self
    }
}

impl Principal for Librarian {
    const KIND: PrincipalKind = PrincipalKind::Librarian;
    const DEFAULT_ROLE: Role = Role::Librarian;

    fn from_account(id: Uuid, account: Account) -> Self {
        Self {
            librarian_id: id,
            account,
        }
    }

    fn id(&self) -> Uuid {
        self.librarian_id
    }

    fn account(&self) -> &Account {
        &self.account
    }

    fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }
}

impl Principal for User {
    const KIND: PrincipalKind = PrincipalKind::User;
    const DEFAULT_ROLE: Role = Role::User;

    fn from_account(id: Uuid, account: Account) -> Self {
        Self {
            user_id: id,
            account,
        }
    }

    fn id(&self) -> Uuid {
        self.user_id
    }

    fn account(&self) -> &Account {
        &self.account
    }

    fn account_mut(&mut self) -> &mut Account {
        &mut self.account
    }
}

/// Trim and lower-case an email before it is stored or looked up.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

// =============================================================================
// Account Requests
// =============================================================================

/// Request to register a librarian or user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !is_valid_email(&normalize_email(&self.email)) {
            return Err(ServiceError::Validation("invalid email".to_string()));
        }
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        if self.password.trim().is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if !is_valid_email(&normalize_email(&self.email)) {
            return Err(ServiceError::Validation("invalid email".to_string()));
        }
        if self.password.is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        Ok(())
    }
}

/// Request to exchange a refresh token for a new token pair.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Partial update of a principal's profile. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    /// New plaintext password; re-hashed before storage
    pub password: Option<String>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(ref first_name) = self.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(ref last_name) = self.last_name {
            validate_name("last_name", last_name)?;
        }
        if let Some(ref password) = self.password {
            if password.trim().is_empty() {
                return Err(ServiceError::Validation(
                    "password must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Loan request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
}

/// Snapshot of the requested book, as returned by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OrderItem {
    /// Catalog key, e.g. `/works/OL45804W`
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub edition_count: u32,
    #[serde(default)]
    pub cover_id: Option<i64>,
    #[serde(default)]
    pub cover_edition_key: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// A loan request placed by a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Order {
    pub order_id: Uuid,
    /// Requesting user
    pub user_id: Uuid,
    /// Librarian who accepted the request
    pub librarian_id: Option<Uuid>,
    pub item: OrderItem,
    pub status: OrderStatus,
    pub pickup_schedule: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to place a loan request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub item: OrderItem,
    pub pickup_schedule: DateTime<Utc>,
}

impl CreateOrderRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ServiceError> {
        if self.item.key.trim().is_empty() {
            return Err(ServiceError::Validation("item.key is required".to_string()));
        }
        if self.item.title.trim().is_empty() {
            return Err(ServiceError::Validation("item.title is required".to_string()));
        }
        if self.pickup_schedule <= now {
            return Err(ServiceError::Validation(
                "pickup_schedule must be in the future".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Pagination
// =============================================================================

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// `?page=&size=` query parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// 1-based page number (default 1)
    pub page: Option<usize>,
    /// Page size (default 10, max 100)
    pub size: Option<usize>,
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub size: usize,
}

impl Pagination {
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.size
    }

    pub fn limit(&self) -> usize {
        self.size
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            limit: self.limit(),
            offset: self.offset(),
            page: self.page,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<PaginationQuery> for Pagination {
    fn from(query: PaginationQuery) -> Self {
        Self {
            page: query.page.unwrap_or(1).max(1),
            size: query
                .size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Pagination metadata echoed in list responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PageMeta {
    pub limit: usize,
    pub offset: usize,
    pub page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_account() -> Account {
        Account {
            email: "ada@library.test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            avatar: None,
            password_hash: "$argon2id$v=19$stub".to_string(),
            role: Role::Librarian,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let librarian = Librarian::from_account(Uuid::new_v4(), sample_account());
        let json = serde_json::to_value(&librarian).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@library.test");
        assert!(json.get("librarian_id").is_some());

        let back: Librarian = serde_json::from_value(json).unwrap();
        assert!(back.account.password_hash.is_empty());
    }

    #[test]
    fn sanitized_clears_hash() {
        let user = User::from_account(Uuid::new_v4(), sample_account()).sanitized();
        assert!(user.account.password_hash.is_empty());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  A@B.com "), "a@b.com");
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a@b.com."));
        assert!(!is_valid_email(&format!("{}@b.com", "a".repeat(60))));
    }

    #[test]
    fn register_request_validation() {
        let mut request = RegisterRequest {
            email: " A@B.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: "secret1".to_string(),
        };
        assert!(request.validate().is_ok());

        request.first_name = " ".to_string();
        assert!(matches!(request.validate(), Err(ServiceError::Validation(_))));

        request.first_name = "Ada".to_string();
        request.password = String::new();
        assert!(matches!(request.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn order_request_requires_future_pickup() {
        let now = Utc::now();
        let mut request = CreateOrderRequest {
            item: OrderItem {
                key: "/works/OL1W".to_string(),
                title: "Dune".to_string(),
                edition_count: 1,
                cover_id: None,
                cover_edition_key: None,
                authors: vec![],
            },
            pickup_schedule: now + Duration::days(1),
        };
        assert!(request.validate(now).is_ok());

        request.pickup_schedule = now - Duration::hours(1);
        assert!(request.validate(now).is_err());
    }

    #[test]
    fn pagination_defaults_and_clamps() {
        let page = Pagination::from(PaginationQuery::default());
        assert_eq!(page, Pagination { page: 1, size: 10 });

        let page = Pagination::from(PaginationQuery {
            page: Some(0),
            size: Some(1_000),
        });
        assert_eq!(page.page, 1);
        assert_eq!(page.size, MAX_PAGE_SIZE);

        let page = Pagination::from(PaginationQuery {
            page: Some(3),
            size: Some(20),
        });
        assert_eq!(page.offset(), 40);
        assert_eq!(page.meta().limit, 20);
    }
}
