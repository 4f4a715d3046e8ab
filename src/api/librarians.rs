// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Librarian endpoints.

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
        Librarian, LoginRequest, PageMeta, Pagination, PaginationQuery, RefreshTokenRequest,
        RegisterRequest, UpdateAccountRequest,
    },
    state::AppState,
};

/// Librarian as returned by the API. Never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct LibrarianResponse {
    pub librarian_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Librarian> for LibrarianResponse {
    fn from(librarian: Librarian) -> Self {
        let account = librarian.account;
        Self {
            librarian_id: librarian.librarian_id,
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
pub struct LibrarianCreatedResponse {
    pub librarian_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LibrarianLoginResponse {
    pub librarian_id: Uuid,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LibrarianListResponse {
    pub meta: PageMeta,
    pub librarians: Vec<LibrarianResponse>,
}

#[utoipa::path(
    post,
    path = "/v1/librarians/login",
    request_body = LoginRequest,
    tag = "Librarians",
    responses(
        (status = 201, description = "Session opened", body = LibrarianLoginResponse),
        (status = 400, description = "Malformed credentials"),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LibrarianLoginResponse>), ApiError> {
    let (librarian, session_id) = state.librarians.login(request).await?;
    let tokens = state
        .librarians
        .generate_token_pair(&librarian, &session_id)?;
    Ok((
        StatusCode::CREATED,
        Json(LibrarianLoginResponse {
            librarian_id: librarian.librarian_id,
            tokens,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/librarians/refresh",
    request_body = RefreshTokenRequest,
    tag = "Librarians",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid, expired or revoked"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state
        .librarians
        .refresh_token_pair(&request.refresh_token)
        .await?;
    Ok(Json(tokens))
}

#[utoipa::path(
    post,
    path = "/v1/librarians",
    request_body = RegisterRequest,
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Librarian created", body = LibrarianCreatedResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Email already registered"),
    )
)]
pub async fn create_librarian(
    State(state): State<AppState>,
    _session: ActiveSession,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LibrarianCreatedResponse>), ApiError> {
    let librarian = state.librarians.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(LibrarianCreatedResponse {
            librarian_id: librarian.librarian_id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/librarians",
    params(PaginationQuery),
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 200, body = LibrarianListResponse),
        (status = 403, description = "Admin only"),
    )
)]
pub async fn list_librarians(
    State(state): State<AppState>,
    AdminOnly(_admin): AdminOnly,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<LibrarianListResponse>, ApiError> {
    let page = Pagination::from(query);
    let librarians = state.librarians.find_all(&page).await?;
    Ok(Json(LibrarianListResponse {
        meta: page.meta(),
        librarians: librarians.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/librarians/me",
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 200, body = LibrarianResponse),
        (status = 401, description = "Token invalid or session ended"),
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    ActiveSession { session, .. }: ActiveSession,
) -> Result<Json<LibrarianResponse>, ApiError> {
    let librarian = state.librarians.me(&session).await?;
    Ok(Json(librarian.into()))
}

#[utoipa::path(
    post,
    path = "/v1/librarians/logout",
    tag = "Librarians",
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
    state.librarians.logout(&user.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/librarians/{id}",
    params(("id" = Uuid, Path, description = "Librarian id")),
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 200, body = LibrarianResponse),
        (status = 404, description = "No such librarian"),
    )
)]
pub async fn get_librarian(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<Json<LibrarianResponse>, ApiError> {
    let librarian = state.librarians.cached_find_by_id(id).await?;
    Ok(Json(librarian.into()))
}

#[utoipa::path(
    put,
    path = "/v1/librarians/{id}",
    params(("id" = Uuid, Path, description = "Librarian id")),
    request_body = UpdateAccountRequest,
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 200, body = LibrarianResponse),
        (status = 403, description = "Not this librarian and not an admin"),
        (status = 404, description = "No such librarian"),
    )
)]
pub async fn update_librarian(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<LibrarianResponse>, ApiError> {
    let librarian = state.librarians.update_by_id(id, request).await?;
    Ok(Json(librarian.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/librarians/{id}",
    params(("id" = Uuid, Path, description = "Librarian id")),
    tag = "Librarians",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Librarian deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No such librarian"),
    )
)]
pub async fn delete_librarian(
    State(state): State<AppState>,
    _session: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.librarians.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
