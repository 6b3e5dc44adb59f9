//! Frame bus
//!
//! One bus serves exactly one host↔frame pair. It owns the readiness gate
//! (queue and latch), so a reconnecting frame needs a fresh bus.
//!
//! # Message flow
//!
//! ```text
//! reader task ──▶ inbound (mpsc) ──▶ run loop ──┬─ IFRAME_READY ──▶ gate.open()
//!                                                └─ other ──▶ spawn(router.route)
//! ```
//!
//! Each request runs in its own task, so a handler waiting on the store
//! does not hold up the next envelope.

use std::sync::Arc;

use shared::message::{CorrelationId, Envelope, MessageType};
use shared::transport::Transport;
use shared::{AppError, AppResult, ErrorCode};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::emitter::Emitter;
use super::gate::ReadinessGate;
use super::router::DispatchRouter;

/// Inbound buffer between the reader task and the run loop
const INBOUND_CAPACITY: usize = 64;

pub struct FrameBus {
    transport: Arc<dyn Transport>,
    gate: Arc<ReadinessGate>,
    router: Arc<DispatchRouter>,
    emitter: Emitter,
    shutdown_token: CancellationToken,
}

impl FrameBus {
    pub fn new(transport: Arc<dyn Transport>, router: DispatchRouter) -> Self {
        let gate = Arc::new(ReadinessGate::new(transport.clone()));
        Self {
            emitter: Emitter::new(gate.clone()),
            transport,
            gate,
            router: Arc::new(router),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Stop the bus when `token` is cancelled
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Send side for host-initiated pushes
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }

    pub fn gate(&self) -> Arc<ReadinessGate> {
        self.gate.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Serve the channel until the frame disconnects or shutdown is requested
    ///
    /// Requests still running when the frame disconnects are awaited;
    /// on shutdown they are aborted.
    pub async fn run(self) -> AppResult<()> {
        let peer = self.transport.peer_addr();
        tracing::info!(peer = ?peer, handlers = self.router.handler_count(), "Frame bus started");

        let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let reader = tokio::spawn(read_loop(self.transport.clone(), inbound_tx));
        let mut in_flight = JoinSet::new();

        let result = loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Frame bus shutting down");
                    in_flight.shutdown().await;
                    break Ok(());
                }

                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Request task failed");
                    }
                }

                inbound = inbound_rx.recv() => match inbound {
                    Some(Ok(envelope)) => self.on_receive(envelope, &mut in_flight).await,
                    Some(Err(e)) if e.code == ErrorCode::PayloadDecodeFailed => {
                        self.on_malformed(e, &mut in_flight);
                    }
                    Some(Err(e)) if e.code == ErrorCode::ClientDisconnected => {
                        tracing::info!(peer = ?peer, "Frame disconnected");
                        break Ok(());
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Frame channel failed");
                        break Err(e);
                    }
                    None => break Ok(()),
                },
            }
        };

        reader.abort();
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined
                && !e.is_cancelled()
            {
                tracing::error!(error = %e, "Request task failed");
            }
        }
        if let Err(e) = self.transport.close().await {
            tracing::debug!(error = %e, "Transport close failed");
        }
        tracing::info!(peer = ?peer, "Frame bus stopped");
        result
    }

    async fn on_receive(&self, envelope: Envelope, in_flight: &mut JoinSet<()>) {
        if envelope.is(MessageType::IframeReady) {
            if !self.gate.open().await {
                tracing::debug!("Duplicate IFRAME_READY ignored");
            }
            return;
        }

        tracing::debug!(
            message_type = %envelope.message_type,
            id = ?envelope.id,
            "Envelope received"
        );
        let router = self.router.clone();
        let emitter = self.emitter.clone();
        in_flight.spawn(async move {
            router.route(envelope, &emitter).await;
        });
    }

    /// Answer an undecodable envelope when its id could still be read
    fn on_malformed(&self, err: AppError, in_flight: &mut JoinSet<()>) {
        let Some(id) = CorrelationId::from_error(&err) else {
            tracing::warn!(error = %err, "Dropping malformed envelope");
            return;
        };

        tracing::warn!(id = %id, error = %err, "Malformed envelope, answering with error");
        let emitter = self.emitter.clone();
        in_flight.spawn(async move {
            if let Err(e) = emitter.fail(Some(id), err.message).await {
                tracing::warn!(error = %e, "Failed to send reply");
            }
        });
    }
}

/// Forward inbound envelopes until the channel fails
///
/// Malformed envelopes are forwarded as errors without ending the loop.
async fn read_loop(
    transport: Arc<dyn Transport>,
    inbound_tx: mpsc::Sender<AppResult<Envelope>>,
) {
    loop {
        let result = transport.read_message().await;
        let fatal = matches!(&result, Err(e) if e.code != ErrorCode::PayloadDecodeFailed);
        if inbound_tx.send(result).await.is_err() || fatal {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::de::IgnoredAny;
    use serde_json::{Value, json};
    use shared::AppError;
    use shared::transport::MemoryTransport;
    use std::time::Duration;

    use crate::message::{CommandHandler, Reply, RequestContext};

    struct Fixed(MessageType);

    #[async_trait]
    impl CommandHandler for Fixed {
        type Request = IgnoredAny;

        async fn handle(&self, _: IgnoredAny, ctx: RequestContext) -> AppResult<Reply> {
            Ok(Reply::new(self.0, json!({"for": ctx.id})))
        }
    }

    struct Boom;

    #[async_trait]
    impl CommandHandler for Boom {
        type Request = IgnoredAny;

        async fn handle(&self, _: IgnoredAny, _ctx: RequestContext) -> AppResult<Reply> {
            Err(AppError::internal("nope"))
        }
    }

    fn start() -> (MemoryTransport, tokio::task::JoinHandle<AppResult<()>>, Emitter) {
        let (host, frame) = MemoryTransport::pair();
        let router = DispatchRouter::new()
            .register_handler(MessageType::FetchOrders, Fixed(MessageType::FetchOrdersResponse))
            .register_handler(MessageType::FetchUsers, Fixed(MessageType::FetchUsersResponse))
            .register_handler(MessageType::CheckoutData, Boom);
        let bus = FrameBus::new(Arc::new(host), router);
        let emitter = bus.emitter();
        (frame, tokio::spawn(bus.run()), emitter)
    }

    #[tokio::test]
    async fn test_requests_before_ready_are_answered_in_order() {
        let (frame, bus, _) = start();
        frame
            .write_message(&Envelope::request(MessageType::FetchOrders, Value::Null, "a"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        frame
            .write_message(&Envelope::request(MessageType::FetchUsers, Value::Null, "b"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(frame.try_read_message().await.is_none());

        frame.write_message(&Envelope::ready()).await.unwrap();
        let first = frame.read_message().await.unwrap();
        let second = frame.read_message().await.unwrap();
        assert!(first.is(MessageType::FetchOrdersResponse));
        assert_eq!(first.id, Some("a".into()));
        assert!(second.is(MessageType::FetchUsersResponse));
        assert_eq!(second.id, Some("b".into()));

        frame.close().await.unwrap();
        bus.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_errors_and_unknown_types_reply_once() {
        let (frame, bus, _) = start();
        frame.write_message(&Envelope::ready()).await.unwrap();
        frame
            .write_message(&Envelope::request(MessageType::CheckoutData, json!({}), 1i64))
            .await
            .unwrap();
        let reply = frame.read_message().await.unwrap();
        assert_eq!(reply.error_message().as_deref(), Some("nope"));
        assert_eq!(reply.id, Some(1i64.into()));

        frame
            .write_message(&Envelope {
                message_type: "MYSTERY".into(),
                data: Value::Null,
                id: Some("m".into()),
            })
            .await
            .unwrap();
        let reply = frame.read_message().await.unwrap();
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"type": "ERROR", "data": {"error": "Unknown message type"}, "id": "m"})
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(frame.try_read_message().await.is_none());
        frame.close().await.unwrap();
        bus.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_ready_and_host_push() {
        let (frame, bus, emitter) = start();
        emitter
            .push(MessageType::UserDataResponse, json!({"user": null}))
            .await
            .unwrap();

        frame.write_message(&Envelope::ready()).await.unwrap();
        frame.write_message(&Envelope::ready()).await.unwrap();

        let pushed = frame.read_message().await.unwrap();
        assert!(pushed.is(MessageType::UserDataResponse));
        assert!(pushed.id.is_none());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(frame.try_read_message().await.is_none());
        frame.close().await.unwrap();
        bus.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_token_stops_bus() {
        let (host, _frame) = MemoryTransport::pair();
        let token = CancellationToken::new();
        let bus = FrameBus::new(Arc::new(host), DispatchRouter::new()).with_shutdown_token(token.clone());
        let handle = tokio::spawn(bus.run());
        token.cancel();
        handle.await.unwrap().unwrap();
    }
}
