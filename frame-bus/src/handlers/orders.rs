//! Order commands

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use shared::AppResult;
use shared::message::{
    FetchOrdersResponse, MessageType, OrderCreatedPayload, OrderCreatedResponse,
    UpdateOrderStatusPayload, UpdateOrderStatusResponse,
};
use validator::Validate;

use crate::db::EntityStore;
use crate::db::repository::OrderRepository;
use crate::message::{CommandHandler, Reply, RequestContext};
use crate::orders::OrderLifecycle;

/// Persist a new order in `pending`
pub struct OrderCreatedHandler {
    orders: OrderRepository,
}

impl OrderCreatedHandler {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            orders: OrderRepository::new(store),
        }
    }
}

#[async_trait]
impl CommandHandler for OrderCreatedHandler {
    type Request = OrderCreatedPayload;

    async fn handle(&self, request: OrderCreatedPayload, _ctx: RequestContext) -> AppResult<Reply> {
        request.validate()?;

        let order = self.orders.create(request).await?;
        tracing::info!(
            order_id = %order.id,
            items = order.items.len(),
            total = order.total,
            "Order created"
        );

        Reply::from_payload(
            MessageType::OrderCreatedResponse,
            &OrderCreatedResponse {
                success: true,
                order_id: order.id,
            },
        )
    }
}

/// All orders, newest first
pub struct FetchOrdersHandler {
    orders: OrderRepository,
}

impl FetchOrdersHandler {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            orders: OrderRepository::new(store),
        }
    }
}

#[async_trait]
impl CommandHandler for FetchOrdersHandler {
    type Request = IgnoredAny;

    async fn handle(&self, _: IgnoredAny, _ctx: RequestContext) -> AppResult<Reply> {
        let orders = self.orders.find_all().await?;
        Reply::from_payload(MessageType::FetchOrdersResponse, &FetchOrdersResponse { orders })
    }
}

/// Status change through the lifecycle validator
pub struct UpdateOrderStatusHandler {
    lifecycle: OrderLifecycle,
}

impl UpdateOrderStatusHandler {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(store),
        }
    }
}

#[async_trait]
impl CommandHandler for UpdateOrderStatusHandler {
    type Request = UpdateOrderStatusPayload;

    async fn handle(
        &self,
        request: UpdateOrderStatusPayload,
        _ctx: RequestContext,
    ) -> AppResult<Reply> {
        let change = self
            .lifecycle
            .apply(request.order_id.as_deref(), request.new_status.as_deref())
            .await?;

        let order = change.order;
        let response = UpdateOrderStatusResponse {
            message: format!("Order status updated to {}", order.status),
            order_id: order.id,
            new_status: order.status,
            success: true,
            timestamp: order.updated_at,
        };
        Reply::from_payload(MessageType::UpdateOrderStatus, &response)
    }
}
