// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan request endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::ActiveSession,
    error::ApiError,
    models::{CreateOrderRequest, Order, PageMeta, Pagination, PaginationQuery},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersResponse {
    pub meta: PageMeta,
    pub orders: Vec<Order>,
}

/// List orders. Users see their own, librarians and admins see all.
#[utoipa::path(
    get,
    path = "/v1/orders",
    params(PaginationQuery),
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, body = OrdersResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    ActiveSession { user, .. }: ActiveSession,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<OrdersResponse>, ApiError> {
    let page = Pagination::from(query);
    let orders = state.orders.find_all(&user, &page).await?;
    Ok(Json(OrdersResponse {
        meta: page.meta(),
        orders,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CreateOrderRequest,
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Invalid item or pickup time"),
        (status = 403, description = "Users only"),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    ActiveSession { user, .. }: ActiveSession,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orders.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, body = Order),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "No such order"),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    ActiveSession { user, .. }: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.find_by_id(&user, id).await?;
    Ok(Json(order))
}

#[utoipa::path(
    post,
    path = "/v1/orders/{id}/accept",
    params(("id" = Uuid, Path, description = "Order id")),
    tag = "Orders",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Order accepted", body = Order),
        (status = 403, description = "Librarians only"),
        (status = 404, description = "No such order"),
        (status = 409, description = "Order already accepted"),
    )
)]
pub async fn accept_order(
    State(state): State<AppState>,
    ActiveSession { user, .. }: ActiveSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state.orders.accept_by_id(&user, id).await?;
    Ok(Json(order))
}
