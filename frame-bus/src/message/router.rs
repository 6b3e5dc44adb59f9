//! Dispatch router
//!
//! Maps a message type to its handler and wraps every invocation in a
//! failure boundary: an `Err`, a panic or (when configured) a timeout all
//! become an `ERROR` reply for the same `id`.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use shared::message::{Envelope, MessageType};
use shared::{AppError, AppResult, ErrorCode};

use super::emitter::Emitter;
use super::handler::{CommandHandler, DynHandler, Reply, RequestContext, Typed};

#[derive(Default)]
pub struct DispatchRouter {
    handlers: HashMap<MessageType, Arc<dyn DynHandler>>,
    handler_timeout: Option<Duration>,
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("handler_timeout", &self.handler_timeout)
            .finish()
    }
}

impl DispatchRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every handler invocation; `None` disables the limit
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Register a handler, replacing any previous one for the same type
    pub fn register_handler<H: CommandHandler>(mut self, message_type: MessageType, handler: H) -> Self {
        if self
            .handlers
            .insert(message_type, Arc::new(Typed(handler)))
            .is_some()
        {
            tracing::debug!(%message_type, "Handler replaced");
        }
        self
    }

    pub fn handles(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Run the handler for `envelope` inside the failure boundary
    pub async fn dispatch(&self, envelope: Envelope) -> AppResult<Reply> {
        let handler = envelope
            .kind()
            .and_then(|kind| self.handlers.get(&kind).cloned().map(|h| (kind, h)));
        let Some((message_type, handler)) = handler else {
            return Err(AppError::unknown_message_type(envelope.message_type));
        };

        let ctx = RequestContext {
            message_type,
            id: envelope.id,
        };
        let guarded = AssertUnwindSafe(handler.call(envelope.data, ctx)).catch_unwind();

        let outcome = match self.handler_timeout {
            Some(limit) => tokio::time::timeout(limit, guarded)
                .await
                .map_err(|_| AppError::timeout())?,
            None => guarded.await,
        };

        outcome.unwrap_or_else(|panic| {
            Err(AppError::with_message(
                ErrorCode::HandlerPanicked,
                panic_message(panic.as_ref()),
            ))
        })
    }

    /// Dispatch and send exactly one reply
    pub async fn route(&self, envelope: Envelope, emitter: &Emitter) {
        let id = envelope.id.clone();
        let message_type = envelope.message_type.clone();
        let started = Instant::now();

        let outcome = self.dispatch(envelope).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(reply) => tracing::debug!(
                message_type = %message_type,
                reply_type = %reply.message_type,
                id = ?id,
                elapsed_ms,
                "Request handled"
            ),
            Err(e) => tracing::warn!(
                message_type = %message_type,
                id = ?id,
                code = %e.code,
                error = %e.message,
                elapsed_ms,
                "Request failed"
            ),
        }

        if let Err(e) = emitter.respond(id, outcome).await {
            tracing::warn!(message_type = %message_type, error = %e, "Failed to send reply");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        ErrorCode::HandlerPanicked.message().to_string()
    }
}
