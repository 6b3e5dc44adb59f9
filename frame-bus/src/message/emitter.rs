//! Response/error emitter
//!
//! Builds correlated envelopes and hands them to the readiness gate.

use std::sync::Arc;

use serde_json::Value;
use shared::AppResult;
use shared::message::{CorrelationId, Envelope, MessageType};

use super::gate::ReadinessGate;
use super::handler::Reply;

/// Cloneable send side of a bus
///
/// The host keeps one to push unsolicited envelopes to the frame.
#[derive(Debug, Clone)]
pub struct Emitter {
    gate: Arc<ReadinessGate>,
}

impl Emitter {
    pub fn new(gate: Arc<ReadinessGate>) -> Self {
        Self { gate }
    }

    /// `{type, data, id}`; dropped when the request carried no id
    pub async fn reply(
        &self,
        id: Option<CorrelationId>,
        message_type: MessageType,
        data: Value,
    ) -> AppResult<()> {
        let Some(id) = id else {
            tracing::debug!(%message_type, "Request had no id, reply dropped");
            return Ok(());
        };
        self.gate
            .deliver(Envelope::new(message_type, data, Some(id)))
            .await
    }

    /// `{type: ERROR, data: {error}, id}`; dropped when the request carried no id
    pub async fn fail(&self, id: Option<CorrelationId>, message: impl Into<String>) -> AppResult<()> {
        let message = message.into();
        let Some(id) = id else {
            tracing::debug!(error = %message, "Request had no id, error dropped");
            return Ok(());
        };
        self.gate.deliver(Envelope::error(Some(id), message)).await
    }

    /// Unsolicited envelope (no id, no reply expected)
    pub async fn push(&self, message_type: MessageType, data: Value) -> AppResult<()> {
        self.gate.deliver(Envelope::push(message_type, data)).await
    }

    /// Send the single answer for a handled request
    pub(crate) async fn respond(
        &self,
        id: Option<CorrelationId>,
        outcome: AppResult<Reply>,
    ) -> AppResult<()> {
        match outcome {
            Ok(reply) => self.reply(id, reply.message_type, reply.data).await,
            Err(e) => self.fail(id, e.message).await,
        }
    }
}
