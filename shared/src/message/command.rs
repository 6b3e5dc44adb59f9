//! Typed request catalog
//!
//! One variant per request row of the command table. The frame client builds
//! envelopes from these instead of hand-assembling JSON.

use serde_json::Value;

use super::{AdminActionPayload, CorrelationId, Envelope, MessageType};
use super::{OrderCreatedPayload, UpdateOrderStatusPayload};

/// Request sent from the frame to the host
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    IframeReady,
    UserDataRequest,
    OrderCreated(OrderCreatedPayload),
    /// Arbitrary checkout payload, forwarded as-is
    CheckoutData(Value),
    FetchOrders,
    FetchUsers,
    UpdateOrderStatus(UpdateOrderStatusPayload),
    AdminAction(AdminActionPayload),
}

impl Command {
    pub fn message_type(&self) -> MessageType {
        match self {
            Command::IframeReady => MessageType::IframeReady,
            Command::UserDataRequest => MessageType::UserDataRequest,
            Command::OrderCreated(_) => MessageType::OrderCreated,
            Command::CheckoutData(_) => MessageType::CheckoutData,
            Command::FetchOrders => MessageType::FetchOrders,
            Command::FetchUsers => MessageType::FetchUsers,
            Command::UpdateOrderStatus(_) => MessageType::UpdateOrderStatus,
            Command::AdminAction(_) => MessageType::AdminAction,
        }
    }

    /// Reply type the host answers with, `None` for the readiness signal
    pub fn reply_type(&self) -> Option<MessageType> {
        match self {
            Command::IframeReady => None,
            Command::UserDataRequest => Some(MessageType::UserDataResponse),
            Command::OrderCreated(_) => Some(MessageType::OrderCreatedResponse),
            Command::CheckoutData(_) => Some(MessageType::CheckoutResponse),
            Command::FetchOrders => Some(MessageType::FetchOrdersResponse),
            Command::FetchUsers => Some(MessageType::FetchUsersResponse),
            Command::UpdateOrderStatus(_) => Some(MessageType::UpdateOrderStatus),
            Command::AdminAction(_) => Some(MessageType::AdminActionResponse),
        }
    }

    fn data(&self) -> Result<Value, serde_json::Error> {
        match self {
            Command::IframeReady
            | Command::UserDataRequest
            | Command::FetchOrders
            | Command::FetchUsers => Ok(Value::Null),
            Command::OrderCreated(p) => serde_json::to_value(p),
            Command::CheckoutData(v) => Ok(v.clone()),
            Command::UpdateOrderStatus(p) => serde_json::to_value(p),
            Command::AdminAction(p) => serde_json::to_value(p),
        }
    }

    pub fn into_envelope(self, id: Option<CorrelationId>) -> Result<Envelope, serde_json::Error> {
        let data = self.data()?;
        Ok(Envelope::new(self.message_type(), data, id))
    }
}
