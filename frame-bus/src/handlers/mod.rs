//! Command handlers
//!
//! | Request | Handler | Reply |
//! |---------|---------|-------|
//! | `USER_DATA_REQUEST` | [`UserDataHandler`] | `USER_DATA_RESPONSE` |
//! | `ORDER_CREATED` | [`OrderCreatedHandler`] | `ORDER_CREATED_RESPONSE` |
//! | `CHECKOUT_DATA` | [`CheckoutHandler`] | `CHECKOUT_RESPONSE` |
//! | `FETCH_ORDERS` | [`FetchOrdersHandler`] | `FETCH_ORDERS_RESPONSE` |
//! | `FETCH_USERS` | [`FetchUsersHandler`] | `FETCH_USERS_RESPONSE` |
//! | `UPDATE_ORDER_STATUS` | [`UpdateOrderStatusHandler`] | `UPDATE_ORDER_STATUS` |
//! | `ADMIN_ACTION` | [`AdminHandler`] | `ADMIN_ACTION_RESPONSE` |

pub mod admin;
pub mod checkout;
pub mod orders;
pub mod user_data;
pub mod users;

pub use admin::AdminHandler;
pub use checkout::CheckoutHandler;
pub use orders::{FetchOrdersHandler, OrderCreatedHandler, UpdateOrderStatusHandler};
pub use user_data::UserDataHandler;
pub use users::FetchUsersHandler;

use shared::message::MessageType;

use crate::core::ServerState;
use crate::message::DispatchRouter;

/// Router with every built-in handler registered
pub fn default_router(state: &ServerState) -> DispatchRouter {
    DispatchRouter::new()
        .with_timeout(state.config.handler_timeout())
        .register_handler(
            MessageType::UserDataRequest,
            UserDataHandler::new(state.session.clone()),
        )
        .register_handler(
            MessageType::OrderCreated,
            OrderCreatedHandler::new(state.store.clone()),
        )
        .register_handler(MessageType::CheckoutData, CheckoutHandler)
        .register_handler(
            MessageType::FetchOrders,
            FetchOrdersHandler::new(state.store.clone()),
        )
        .register_handler(
            MessageType::FetchUsers,
            FetchUsersHandler::new(state.store.clone()),
        )
        .register_handler(
            MessageType::UpdateOrderStatus,
            UpdateOrderStatusHandler::new(state.store.clone()),
        )
        .register_handler(
            MessageType::AdminAction,
            AdminHandler::new(state.store.clone(), state.mailer.clone()),
        )
}
