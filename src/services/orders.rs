// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan requests.
//!
//! Users place orders for themselves; librarians accept them. Users only
//! ever see their own orders, librarians and admins see all of them.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, Role};
use crate::error::ServiceError;
use crate::models::{CreateOrderRequest, Order, OrderStatus, Pagination, PrincipalKind};
use crate::storage::{CachedRepository, EntityCache, KvStore, OrderRepository};

pub struct OrderService {
    orders: CachedRepository<Order, dyn OrderRepository>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, cache: Arc<dyn KvStore>, cache_ttl: Duration) -> Self {
        Self {
            orders: CachedRepository::new(repository, EntityCache::new(cache, cache_ttl)),
        }
    }

    fn repository(&self) -> &dyn OrderRepository {
        self.orders.repository()
    }

    /// Place a pending order on behalf of the calling user.
    pub async fn create(
        &self,
        caller: &AuthenticatedUser,
        request: CreateOrderRequest,
    ) -> Result<Order, ServiceError> {
        if caller.principal.kind != PrincipalKind::User {
            return Err(ServiceError::Forbidden(
                "only users can place orders".to_string(),
            ));
        }
        let now = Utc::now();
        request.validate(now)?;

        let order = Order {
            order_id: Uuid::new_v4(),
            user_id: caller.principal.id,
            librarian_id: None,
            item: request.item,
            status: OrderStatus::Pending,
            pickup_schedule: request.pickup_schedule,
            created_at: now,
            updated_at: now,
        };

        self.repository().create(&order).await?;
        self.orders.refresh(&order).await;

        tracing::info!(order_id = %order.order_id, user_id = %order.user_id, "order placed");
        Ok(order)
    }

    pub async fn find_all(
        &self,
        caller: &AuthenticatedUser,
        page: &Pagination,
    ) -> Result<Vec<Order>, ServiceError> {
        let orders = if caller.role == Role::User {
            self.repository()
                .find_all_by_user_id(caller.principal.id, page)
                .await?
        } else {
            self.repository().find_all(page).await?
        };
        Ok(orders)
    }

    /// Cached read, restricted to the owner, librarians and admins.
    pub async fn find_by_id(
        &self,
        caller: &AuthenticatedUser,
        order_id: Uuid,
    ) -> Result<Order, ServiceError> {
        let order = self.orders.cached_find_by_id(order_id).await?;
        if caller.role == Role::User && order.user_id != caller.principal.id {
            return Err(ServiceError::Forbidden(
                "order belongs to another user".to_string(),
            ));
        }
        Ok(order)
    }

    /// Mark a pending order accepted by the calling librarian.
    pub async fn accept_by_id(
        &self,
        caller: &AuthenticatedUser,
        order_id: Uuid,
    ) -> Result<Order, ServiceError> {
        if caller.principal.kind != PrincipalKind::Librarian {
            return Err(ServiceError::Forbidden(
                "only librarians can accept orders".to_string(),
            ));
        }

        // Status decisions are made on the primary copy
        let mut order = self.repository().find_by_id(order_id).await?;
        if order.status == OrderStatus::Accepted {
            return Err(ServiceError::Conflict(format!(
                "order {order_id} is already accepted"
            )));
        }

        order.status = OrderStatus::Accepted;
        order.librarian_id = Some(caller.principal.id);
        order.updated_at = Utc::now();

        self.repository().update(&order).await?;
        self.orders.refresh(&order).await;

        tracing::info!(%order_id, librarian_id = %caller.principal.id, "order accepted");
        Ok(order)
    }
}
