//! Command handler trait
//!
//! Handlers are typed: the router decodes `data` into
//! [`CommandHandler::Request`] before calling them, so a handler only ever
//! sees a well-formed request. Commands without data use
//! [`serde::de::IgnoredAny`].

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::message::{CorrelationId, MessageType};
use shared::{AppError, AppResult};

/// Successful handler outcome, sent back as `{type, data, id}`
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message_type: MessageType,
    pub data: Value,
}

impl Reply {
    pub fn new(message_type: MessageType, data: Value) -> Self {
        Self { message_type, data }
    }

    /// Serialize a typed payload into a reply
    pub fn from_payload<T: Serialize>(message_type: MessageType, payload: &T) -> AppResult<Self> {
        let data = serde_json::to_value(payload)
            .map_err(|e| AppError::internal(format!("Failed to encode reply: {}", e)))?;
        Ok(Self::new(message_type, data))
    }
}

/// What a handler knows about the request besides its payload
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub message_type: MessageType,
    pub id: Option<CorrelationId>,
}

/// Command handler trait
///
/// Implement this to serve one message type. Returning `Err` (or
/// panicking) makes the router answer with an `ERROR` envelope instead.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Typed request decoded from the envelope's `data`
    type Request: DeserializeOwned + Send + 'static;

    async fn handle(&self, request: Self::Request, ctx: RequestContext) -> AppResult<Reply>;
}

/// Object-safe view of a [`CommandHandler`]
#[async_trait]
pub(crate) trait DynHandler: Send + Sync {
    async fn call(&self, data: Value, ctx: RequestContext) -> AppResult<Reply>;
}

pub(crate) struct Typed<H>(pub H);

#[async_trait]
impl<H: CommandHandler> DynHandler for Typed<H> {
    async fn call(&self, data: Value, ctx: RequestContext) -> AppResult<Reply> {
        let request = decode_request::<H::Request>(data)?;
        self.0.handle(request, ctx).await
    }
}

/// Decode `data`, reading a missing payload as `{}`
///
/// Lets all-optional request structs report their own missing-field errors.
pub(crate) fn decode_request<T: DeserializeOwned>(data: Value) -> AppResult<T> {
    if data.is_null() {
        if let Ok(request) = T::deserialize(&Value::Null) {
            return Ok(request);
        }
        return Ok(T::deserialize(&Value::Object(Map::new()))?);
    }
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde::de::IgnoredAny;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Partial {
        #[serde(default)]
        name: Option<String>,
    }

    #[test]
    fn test_null_data_decodes_as_empty_object() {
        let p: Partial = decode_request(Value::Null).unwrap();
        assert!(p.name.is_none());

        let _: IgnoredAny = decode_request(Value::Null).unwrap();
        let v: Value = decode_request(Value::Null).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_wrong_shape_is_payload_error() {
        let err = decode_request::<Partial>(json!({"name": 42})).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::PayloadDecodeFailed);
        assert!(err.message.starts_with("Invalid payload"));
    }
}
