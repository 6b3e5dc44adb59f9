//! Envelope and message catalog
//!
//! These types are shared by the host bus and the frame client. Every
//! message crossing the boundary is an [`Envelope`]:
//!
//! ```json
//! { "type": "UPDATE_ORDER_STATUS", "data": { "orderId": "o1", "newStatus": "shipped" }, "id": "r1" }
//! ```
//!
//! `type` is kept as a raw string on the envelope so that unknown types can
//! still be parsed and answered with an `ERROR` reply.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

pub mod command;
pub mod payload;

pub use command::Command;
pub use payload::*;

use crate::error::{AppError, ErrorPayload};

/// Closed catalog of envelope types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Frame finished registering its listener
    IframeReady,
    UserDataRequest,
    UserDataResponse,
    OrderCreated,
    OrderCreatedResponse,
    CheckoutData,
    CheckoutResponse,
    FetchOrders,
    FetchOrdersResponse,
    FetchUsers,
    FetchUsersResponse,
    /// Request and reply share this type
    UpdateOrderStatus,
    AdminAction,
    AdminActionResponse,
    Error,
}

impl MessageType {
    pub const ALL: [MessageType; 15] = [
        MessageType::IframeReady,
        MessageType::UserDataRequest,
        MessageType::UserDataResponse,
        MessageType::OrderCreated,
        MessageType::OrderCreatedResponse,
        MessageType::CheckoutData,
        MessageType::CheckoutResponse,
        MessageType::FetchOrders,
        MessageType::FetchOrdersResponse,
        MessageType::FetchUsers,
        MessageType::FetchUsersResponse,
        MessageType::UpdateOrderStatus,
        MessageType::AdminAction,
        MessageType::AdminActionResponse,
        MessageType::Error,
    ];

    /// Wire name of this type
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageType::IframeReady => "IFRAME_READY",
            MessageType::UserDataRequest => "USER_DATA_REQUEST",
            MessageType::UserDataResponse => "USER_DATA_RESPONSE",
            MessageType::OrderCreated => "ORDER_CREATED",
            MessageType::OrderCreatedResponse => "ORDER_CREATED_RESPONSE",
            MessageType::CheckoutData => "CHECKOUT_DATA",
            MessageType::CheckoutResponse => "CHECKOUT_RESPONSE",
            MessageType::FetchOrders => "FETCH_ORDERS",
            MessageType::FetchOrdersResponse => "FETCH_ORDERS_RESPONSE",
            MessageType::FetchUsers => "FETCH_USERS",
            MessageType::FetchUsersResponse => "FETCH_USERS_RESPONSE",
            MessageType::UpdateOrderStatus => "UPDATE_ORDER_STATUS",
            MessageType::AdminAction => "ADMIN_ACTION",
            MessageType::AdminActionResponse => "ADMIN_ACTION_RESPONSE",
            MessageType::Error => "ERROR",
        }
    }
}

impl FromStr for MessageType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessageType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::unknown_message_type(s))
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque correlation token
///
/// The frame may use any JSON string or number (floats and values past
/// `i64::MAX` included); whatever arrives is echoed back verbatim on the
/// reply. `null` is treated as no id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationId {
    Text(String),
    Number(Number),
}

/// Detail key under which a transport stores the id of an undecodable envelope
const RECOVERED_ID_DETAIL: &str = "id";

impl CorrelationId {
    /// Fresh random id (used by the frame client)
    pub fn generate() -> Self {
        CorrelationId::Text(uuid::Uuid::new_v4().to_string())
    }

    /// Pull the `id` out of raw bytes that did not decode as an [`Envelope`]
    pub fn recover(bytes: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(bytes).ok()?;
        serde_json::from_value(value.get("id")?.clone()).ok()
    }

    /// Id attached to a decode error with [`CorrelationId::attach`]
    pub fn from_error(err: &AppError) -> Option<Self> {
        let value = err.details.as_ref()?.get(RECOVERED_ID_DETAIL)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Record this id on a decode error so the receiver can still answer it
    pub fn attach(self, err: AppError) -> AppError {
        err.with_detail(RECOVERED_ID_DETAIL, self)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationId::Text(s) => f.write_str(s),
            CorrelationId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        CorrelationId::Text(s.to_string())
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        CorrelationId::Text(s)
    }
}

impl From<i64> for CorrelationId {
    fn from(n: i64) -> Self {
        CorrelationId::Number(n.into())
    }
}

impl From<u64> for CorrelationId {
    fn from(n: u64) -> Self {
        CorrelationId::Number(n.into())
    }
}

impl From<CorrelationId> for Value {
    fn from(id: CorrelationId) -> Self {
        match id {
            CorrelationId::Text(s) => Value::String(s),
            CorrelationId::Number(n) => Value::Number(n),
        }
    }
}

/// The unit of communication across the boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
}

impl Envelope {
    pub fn new(message_type: MessageType, data: Value, id: Option<CorrelationId>) -> Self {
        Self {
            message_type: message_type.as_str().to_string(),
            data,
            id,
        }
    }

    /// Request expecting exactly one reply
    pub fn request(message_type: MessageType, data: Value, id: impl Into<CorrelationId>) -> Self {
        Self::new(message_type, data, Some(id.into()))
    }

    /// Unsolicited push (no reply expected)
    pub fn push(message_type: MessageType, data: Value) -> Self {
        Self::new(message_type, data, None)
    }

    /// Readiness signal sent by the frame
    pub fn ready() -> Self {
        Self::push(MessageType::IframeReady, Value::Null)
    }

    /// `ERROR` envelope echoing `id`
    pub fn error(id: Option<CorrelationId>, message: impl Into<String>) -> Self {
        let data = serde_json::to_value(ErrorPayload::new(message)).unwrap_or(Value::Null);
        Self::new(MessageType::Error, data, id)
    }

    /// Parsed envelope type, `None` when outside the catalog
    pub fn kind(&self) -> Option<MessageType> {
        self.message_type.parse().ok()
    }

    pub fn is(&self, message_type: MessageType) -> bool {
        self.message_type == message_type.as_str()
    }

    pub fn is_error(&self) -> bool {
        self.is(MessageType::Error)
    }

    /// Error text of an `ERROR` envelope
    pub fn error_message(&self) -> Option<String> {
        if !self.is_error() {
            return None;
        }
        serde_json::from_value::<ErrorPayload>(self.data.clone())
            .ok()
            .map(|p| p.error)
    }

    /// Decode `data` into a typed payload
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
