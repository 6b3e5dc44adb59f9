use async_trait::async_trait;
use serde_json::Value;
use shared::AppResult;
use shared::message::{CheckoutResponse, MessageType};

use crate::message::{CommandHandler, Reply, RequestContext};

/// Acknowledges checkout data; the payload is only logged
pub struct CheckoutHandler;

#[async_trait]
impl CommandHandler for CheckoutHandler {
    type Request = Value;

    async fn handle(&self, request: Value, ctx: RequestContext) -> AppResult<Reply> {
        let fields = request
            .as_object()
            .map(|o| o.keys().cloned().collect::<Vec<_>>().join(","))
            .unwrap_or_default();
        tracing::info!(id = ?ctx.id, fields = %fields, "Checkout data received");

        Reply::from_payload(
            MessageType::CheckoutResponse,
            &CheckoutResponse {
                success: true,
                message: "Checkout data received".to_string(),
            },
        )
    }
}
