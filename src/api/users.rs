// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.
//!
//! Patrons register themselves; the bootstrap admin is a user account too,
//! so `/me` and `/logout` accept both roles.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{ActiveSession, AdminOnly, Role, TokenPair},
    error::ApiError,
    models::{
        LoginRequest, PageMeta, Pagination, PaginationQuery, RefreshTokenRequest,
        RegisterRequest, UpdateAccountRequest, User,
    },
    state::AppState,
};

/// User as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    /// `user` or `admin`
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let account = user.account;
        Self {
            user_id: user.user_id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            avatar: account.avatar,
            role: account.role,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCreatedResponse {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserLoginResponse {
    pub user_id: Uuid,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub meta: PageMeta,
    pub users: Vec<UserResponse>,
}

/// Register a patron account.
#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = RegisterRequest,
    tag = "Users",
    responses(
        (status = 201, description = "User registered", body = UserCreatedResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let user = state.users.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            user_id: user.user_id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/users/login",
    request_body = LoginRequest,
    tag = "Users",
    responses(
        (status = 201, description = "Session opened", body = UserLoginResponse),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<UserLoginResponse>), ApiError> {
    let (user, session_id) = state.users.login(request).await?;
    let tokens = state.users.generate_token_pair(&user, &session_id)?;
    Ok((
        StatusCode::CREATED,
        Json(UserLoginResponse {
            user_id: user.user_id,
            tokens,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/users/refresh",
    request_body = RefreshTokenRequest,
    tag = "Users",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid, expired or revoked"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state.users.refresh_token_pair(&request.refresh_token).await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    get,
    path = "/v1/users",
    params(PaginationQuery),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserListResponse),
        (status = 403, description = "Admin only"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let page = Pagination::from(query);
    let users = state.users.find_all(&page).await?;
    Ok(Json(UserListResponse {
        meta: page.meta(),
        users: users.into_iter().map(Into::into).collect(),
    }))
}

/// Get the current user's profile.
///
/// The session behind the token must still exist; a token kept after
/// logout is rejected here.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 401, description = "Unauthorized - invalid token or ended session"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    ActiveSession { session, .. }: ActiveSession,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.me(&session).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/v1/users/logout",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Token invalid or session already ended"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    ActiveSession { user, .. }: ActiveSession,
) -> Result<StatusCode, ApiError> {
    state.users.logout(&user.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserResponse),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.cached_find_by_id(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateAccountRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserResponse),
        (status = 403, description = "Not this user and not an admin"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.update_by_id(id, request).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
