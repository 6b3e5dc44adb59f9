//! Order lifecycle validator
//!
//! Shared by `UPDATE_ORDER_STATUS` and the admin `UPDATE_ORDER` action.
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. `orderId` and `newStatus` present (no store access otherwise)
//! 2. `newStatus` is a known [`OrderStatus`]
//! 3. the order exists
//! 4. the store accepts `{status, updatedAt}`
//!
//! Only membership is checked. Any status may follow any other, which lets
//! an operator correct a mistaken status.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{InvalidOrderStatus, Order, OrderStatus};
use thiserror::Error;

use crate::db::repository::OrderRepository;
use crate::db::{EntityStore, StoreError};

/// Lifecycle errors
///
/// The `Display` text is what the frame sees.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Missing required fields: orderId and newStatus")]
    MissingFields,

    #[error(transparent)]
    InvalidStatus(#[from] InvalidOrderStatus),

    #[error("Error looking up order: {0}")]
    Lookup(StoreError),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Failed to update order: {0}")]
    Update(StoreError),
}

impl LifecycleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LifecycleError::MissingFields => ErrorCode::RequiredField,
            LifecycleError::InvalidStatus(_) => ErrorCode::InvalidStatus,
            LifecycleError::Lookup(_) | LifecycleError::Update(_) => ErrorCode::DatabaseError,
            LifecycleError::NotFound(_) => ErrorCode::OrderNotFound,
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        AppError::with_message(err.code(), err.to_string())
    }
}

/// Outcome of an accepted status change
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub previous: OrderStatus,
    /// The order as stored after the update
    pub order: Order,
}

#[derive(Clone)]
pub struct OrderLifecycle {
    orders: OrderRepository,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            orders: OrderRepository::new(store),
        }
    }

    /// Steps 1 and 2, no store access
    pub fn validate<'a>(
        order_id: Option<&'a str>,
        new_status: Option<&str>,
    ) -> Result<(&'a str, OrderStatus), LifecycleError> {
        let (order_id, new_status) = match (order_id, new_status) {
            (Some(id), Some(status)) if !id.is_empty() && !status.is_empty() => (id, status),
            _ => return Err(LifecycleError::MissingFields),
        };
        let status = new_status.parse::<OrderStatus>()?;
        Ok((order_id, status))
    }

    /// Validate and apply a status change
    pub async fn apply(
        &self,
        order_id: Option<&str>,
        new_status: Option<&str>,
    ) -> Result<StatusChange, LifecycleError> {
        let (order_id, status) = Self::validate(order_id, new_status)?;

        let current = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(LifecycleError::Lookup)?
            .ok_or_else(|| LifecycleError::NotFound(order_id.to_string()))?;

        let order = self
            .orders
            .update_status(order_id, status)
            .await
            .map_err(LifecycleError::Update)?;

        tracing::info!(
            order_id = %order_id,
            from = %current.status,
            to = %status,
            "Order status updated"
        );

        Ok(StatusChange {
            previous: current.status,
            order,
        })
    }
}
