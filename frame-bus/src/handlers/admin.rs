//! Admin sub-router
//!
//! `ADMIN_ACTION` carries a nested `{action, data}`. An action outside
//! [`AdminAction`] is answered like an unknown top-level command (`ERROR`).
//! Known actions always answer with `ADMIN_ACTION_RESPONSE`, carrying
//! `success: false` and the error text when the action fails.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared::message::{
    AdminAction, AdminActionPayload, AdminActionResponse, AdminSendEmail, AdminUpdateOrder,
    AdminViewUser, MessageType,
};
use shared::{AppError, AppResult, ErrorCode};
use validator::Validate;

use crate::db::EntityStore;
use crate::db::repository::UserRepository;
use crate::message::handler::decode_request;
use crate::message::{CommandHandler, Reply, RequestContext};
use crate::orders::OrderLifecycle;
use crate::services::{Mailer, OutgoingEmail};

pub struct AdminHandler {
    lifecycle: OrderLifecycle,
    users: UserRepository,
    mailer: Arc<dyn Mailer>,
}

impl AdminHandler {
    pub fn new(store: Arc<dyn EntityStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            lifecycle: OrderLifecycle::new(store.clone()),
            users: UserRepository::new(store),
            mailer,
        }
    }

    async fn update_order(&self, data: Value) -> AppResult<AdminActionResponse> {
        let request: AdminUpdateOrder = decode_request(data)?;
        let change = self
            .lifecycle
            .apply(request.order_id.as_deref(), request.status.as_deref())
            .await?;

        Ok(AdminActionResponse::success(AdminAction::UpdateOrder)
            .with("orderId", change.order.id)
            .with("status", change.order.status.as_str())
            .with(
                "message",
                format!("Order status changed from {} to {}", change.previous, change.order.status),
            ))
    }

    async fn view_user(&self, data: Value) -> AppResult<AdminActionResponse> {
        let request: AdminViewUser = decode_request(data)?;
        let user_id = request
            .user_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::required_field("Missing required field: userId"))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await
            .map_err(|e| AppError::database(format!("Error looking up user: {}", e)))?
            .ok_or_else(|| {
                AppError::with_message(ErrorCode::UserNotFound, format!("User not found: {}", user_id))
            })?;

        let user = serde_json::to_value(user)
            .map_err(|e| AppError::internal(format!("Failed to encode user: {}", e)))?;
        Ok(AdminActionResponse::success(AdminAction::ViewUser).with("user", user))
    }

    async fn send_email(&self, data: Value) -> AppResult<AdminActionResponse> {
        let request: AdminSendEmail = decode_request(data)?;
        request.validate()?;

        let email = OutgoingEmail {
            to: request.to,
            subject: request.subject,
            body: request.body,
        };
        self.mailer.send(&email).await.map_err(|e| {
            AppError::with_message(ErrorCode::MailerError, format!("Failed to send email: {}", e))
        })?;

        Ok(AdminActionResponse::success(AdminAction::SendEmail)
            .with("message", format!("Email sent to {}", email.to)))
    }
}

#[async_trait]
impl CommandHandler for AdminHandler {
    type Request = AdminActionPayload;

    async fn handle(&self, request: AdminActionPayload, ctx: RequestContext) -> AppResult<Reply> {
        let action: AdminAction = request.action.parse()?;
        tracing::info!(target: "audit", action = %action, id = ?ctx.id, "Admin action");

        let outcome = match action {
            AdminAction::UpdateOrder => self.update_order(request.data).await,
            AdminAction::ViewUser => self.view_user(request.data).await,
            AdminAction::SendEmail => self.send_email(request.data).await,
        };

        let response = outcome.unwrap_or_else(|e| {
            tracing::warn!(action = %action, code = %e.code, error = %e.message, "Admin action failed");
            AdminActionResponse::failure(action, e.message)
        });
        Reply::from_payload(MessageType::AdminActionResponse, &response)
    }
}
