// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory order repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FindById, OrderRepository};
use crate::models::{Order, Pagination};
use crate::storage::{StorageError, StorageResult};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    rows: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn page<'a>(orders: impl Iterator<Item = &'a Order>, page: &Pagination) -> Vec<Order> {
        let mut orders: Vec<&Order> = orders.collect();
        orders.sort_by_key(|o| (o.created_at, o.order_id));
        orders
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl FindById<Order> for InMemoryOrderRepository {
    async fn find_by_id(&self, id: Uuid) -> StorageResult<Order> {
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("order {id}")))
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> StorageResult<()> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&order.order_id) {
            return Err(StorageError::AlreadyExists(format!(
                "order {}",
                order.order_id
            )));
        }
        rows.insert(order.order_id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> StorageResult<()> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&order.order_id) {
            Some(row) => {
                *row = order.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(format!("order {}", order.order_id))),
        }
    }

    async fn find_all(&self, page: &Pagination) -> StorageResult<Vec<Order>> {
        Ok(Self::page(self.rows.read().await.values(), page))
    }

    async fn find_all_by_user_id(
        &self,
        user_id: Uuid,
        page: &Pagination,
    ) -> StorageResult<Vec<Order>> {
        let rows = self.rows.read().await;
        Ok(Self::page(
            rows.values().filter(|o| o.user_id == user_id),
            page,
        ))
    }
}
