// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        authorize,
        roles::{ADMIN_ONLY, LIBRARIAN_ONLY, PATRON_OR_ADMIN, USER_ONLY},
        Access, Role, RouteGate, TokenIssuer, TokenPair,
    },
    models::{
        CreateOrderRequest, LoginRequest, Order, OrderItem, OrderStatus, PageMeta,
        PrincipalKind, RefreshTokenRequest, RegisterRequest, UpdateAccountRequest,
    },
    state::AppState,
};

pub mod health;
pub mod librarians;
pub mod orders;
pub mod users;

/// Wrap `route` with the authorization gate for `access`.
fn guarded(
    route: MethodRouter<AppState>,
    tokens: &Arc<TokenIssuer>,
    access: Access,
) -> MethodRouter<AppState> {
    route.layer(from_fn_with_state(
        RouteGate::new(tokens.clone(), access),
        authorize,
    ))
}

pub fn router(state: AppState) -> Router {
    let tokens = state.tokens.clone();
    let t = &tokens;

    let v1_routes = Router::new()
        // Librarians
        .route("/librarians/login", post(librarians::login))
        .route("/librarians/refresh", post(librarians::refresh))
        .route(
            "/librarians",
            guarded(
                post(librarians::create_librarian).get(librarians::list_librarians),
                t,
                Access::AnyOf(ADMIN_ONLY),
            ),
        )
        .route(
            "/librarians/me",
            guarded(get(librarians::get_me), t, Access::AnyOf(LIBRARIAN_ONLY)),
        )
        .route(
            "/librarians/logout",
            guarded(post(librarians::logout), t, Access::AnyOf(LIBRARIAN_ONLY)),
        )
        .route(
            "/librarians/{id}",
            guarded(get(librarians::get_librarian), t, Access::Authenticated)
                .merge(guarded(
                    put(librarians::update_librarian),
                    t,
                    Access::SelfOrAdmin(PrincipalKind::Librarian),
                ))
                .merge(guarded(
                    delete(librarians::delete_librarian),
                    t,
                    Access::AnyOf(ADMIN_ONLY),
                )),
        )
        // Users
        .route(
            "/users",
            post(users::register).merge(guarded(
                get(users::list_users),
                t,
                Access::AnyOf(ADMIN_ONLY),
            )),
        )
        .route("/users/login", post(users::login))
        .route("/users/refresh", post(users::refresh))
        .route(
            "/users/me",
            guarded(get(users::get_current_user), t, Access::AnyOf(PATRON_OR_ADMIN)),
        )
        .route(
            "/users/logout",
            guarded(post(users::logout), t, Access::AnyOf(PATRON_OR_ADMIN)),
        )
        .route(
            "/users/{id}",
            guarded(get(users::get_user), t, Access::Authenticated)
                .merge(guarded(
                    put(users::update_user),
                    t,
                    Access::SelfOrAdmin(PrincipalKind::User),
                ))
                .merge(guarded(
                    delete(users::delete_user),
                    t,
                    Access::AnyOf(ADMIN_ONLY),
                )),
        )
        // Orders
        .route(
            "/orders",
            guarded(get(orders::list_orders), t, Access::Authenticated).merge(guarded(
                post(orders::create_order),
                t,
                Access::AnyOf(USER_ONLY),
            )),
        )
        .route(
            "/orders/{id}",
            guarded(get(orders::get_order), t, Access::Authenticated),
        )
        .route(
            "/orders/{id}/accept",
            guarded(post(orders::accept_order), t, Access::AnyOf(LIBRARIAN_ONLY)),
        );

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        librarians::login,
        librarians::refresh,
        librarians::create_librarian,
        librarians::list_librarians,
        librarians::get_me,
        librarians::logout,
        librarians::get_librarian,
        librarians::update_librarian,
        librarians::delete_librarian,
        users::register,
        users::login,
        users::refresh,
        users::list_users,
        users::get_current_user,
        users::logout,
        users::get_user,
        users::update_user,
        users::delete_user,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::accept_order
    ),
    components(
        schemas(
            Role,
            TokenPair,
            PageMeta,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UpdateAccountRequest,
            Order,
            OrderItem,
            OrderStatus,
            CreateOrderRequest,
            librarians::LibrarianResponse,
            librarians::LibrarianCreatedResponse,
            librarians::LibrarianLoginResponse,
            librarians::LibrarianListResponse,
            users::UserResponse,
            users::UserCreatedResponse,
            users::UserLoginResponse,
            users::UserListResponse,
            orders::OrdersResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and store reachability"),
        (name = "Librarians", description = "Librarian accounts and sessions"),
        (name = "Users", description = "User accounts and sessions"),
        (name = "Orders", description = "Loan requests")
    )
)]
struct ApiDoc;
