//! Order Repository
//!
//! Orders are created by `ORDER_CREATED` and only ever change status.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use shared::message::OrderCreatedPayload;
use shared::models::{ORDERS_COLLECTION, Order, OrderStatus};

use super::{BaseRepository, decode, encode};
use crate::db::{EntityStore, Query, Record, StoreResult};

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// All orders, newest first
    pub async fn find_all(&self) -> StoreResult<Vec<Order>> {
        self.base
            .store()
            .query(ORDERS_COLLECTION, &Query::newest_first())
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Order>> {
        self.base
            .store()
            .get(ORDERS_COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Persist a new `pending` order
    pub async fn create(&self, payload: OrderCreatedPayload) -> StoreResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            email: payload.email,
            items: payload.items,
            subtotal: payload.subtotal,
            tax: payload.tax,
            shipping: payload.shipping.unwrap_or_default(),
            total: payload.total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let saved = self
            .base
            .store()
            .insert(ORDERS_COLLECTION, encode(&order)?)
            .await?;
        decode(saved)
    }

    /// Set `status` and refresh `updatedAt`
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> StoreResult<Order> {
        let partial = status_patch(status);
        let saved = self
            .base
            .store()
            .update(ORDERS_COLLECTION, id, partial)
            .await?;
        decode(saved)
    }
}

fn status_patch(status: OrderStatus) -> Record {
    let mut patch = Record::new();
    patch.insert("status".into(), Value::String(status.as_str().to_string()));
    patch.insert("updatedAt".into(), json!(Utc::now()));
    patch
}
