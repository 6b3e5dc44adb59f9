//! Frame client
//!
//! Request/response over a [`Transport`]:
//! ```text
//! request() ──► pending[id] = oneshot ──► transport.write
//!                                              │
//! reader task ◄── transport.read ◄─────────────┘
//!     ├── id matches pending → oneshot.send(reply)
//!     └── otherwise          → broadcast (host pushes)
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::message::{
    AdminAction, AdminActionPayload, AdminActionResponse, CheckoutResponse, Command,
    CorrelationId, Envelope, FetchOrdersResponse, FetchUsersResponse, OrderCreatedPayload,
    OrderCreatedResponse, UpdateOrderStatusPayload, UpdateOrderStatusResponse, UserDataResponse,
};
use shared::models::{Order, User};
use shared::transport::{TcpTransport, Transport};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::config::FrameClientConfig;
use crate::error::{ClientError, ClientResult};

type PendingMap = DashMap<CorrelationId, oneshot::Sender<Envelope>>;

/// Embedded-side client of the frame bus
#[derive(Debug, Clone)]
pub struct FrameClient {
    transport: Arc<dyn Transport>,
    pending: Arc<PendingMap>,
    event_tx: broadcast::Sender<Envelope>,
    reader: Arc<JoinHandle<()>>,
    config: FrameClientConfig,
}

impl FrameClient {
    /// Wrap a connected transport and start the reader task
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, config: FrameClientConfig) -> Self {
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        let reader = tokio::spawn(Self::read_loop(
            transport.clone(),
            pending.clone(),
            event_tx.clone(),
        ));

        Self {
            transport,
            pending,
            event_tx,
            reader: Arc::new(reader),
            config,
        }
    }

    /// Connect to a host over TCP
    pub async fn connect(addr: &str, config: FrameClientConfig) -> ClientResult<Self> {
        let transport = TcpTransport::connect(addr).await?;
        tracing::info!(addr = %addr, "Frame client connected");
        Ok(Self::new(Arc::new(transport), config))
    }

    async fn read_loop(
        transport: Arc<dyn Transport>,
        pending: Arc<PendingMap>,
        event_tx: broadcast::Sender<Envelope>,
    ) {
        loop {
            let envelope = match transport.read_message().await {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::debug!(error = %e, "Frame client reader stopped");
                    break;
                }
            };

            let waiter = envelope
                .id
                .as_ref()
                .and_then(|id| pending.remove(id))
                .map(|(_, tx)| tx);

            match waiter {
                Some(tx) => {
                    // Receiver may already have timed out
                    let _ = tx.send(envelope);
                }
                None => {
                    if let Some(id) = &envelope.id {
                        tracing::debug!(id = %id, message_type = %envelope.message_type, "Reply without a waiting request");
                    }
                    let _ = event_tx.send(envelope);
                }
            }
        }

        // Dropping the senders wakes every waiter with `Closed`
        pending.clear();
    }

    /// Signal that the frame is ready to receive host messages
    pub async fn ready(&self) -> ClientResult<()> {
        self.send(Command::IframeReady).await
    }

    /// Send a command without waiting for a reply
    pub async fn send(&self, command: Command) -> ClientResult<()> {
        let envelope = command.into_envelope(None)?;
        self.transport.write_message(&envelope).await?;
        Ok(())
    }

    /// Send a command and wait for its correlated reply
    ///
    /// An `ERROR` reply is returned as [`ClientError::Remote`].
    pub async fn request(&self, command: Command) -> ClientResult<Envelope> {
        let envelope = command.into_envelope(Some(CorrelationId::generate()))?;
        let reply = self.request_envelope(envelope).await?;

        if reply.is_error() {
            return Err(ClientError::Remote(
                reply.error_message().unwrap_or_default(),
            ));
        }
        Ok(reply)
    }

    /// Send a prepared envelope and wait for the reply with the same id
    ///
    /// An id is generated when the envelope has none. `ERROR` replies are
    /// returned as-is.
    pub async fn request_envelope(&self, mut envelope: Envelope) -> ClientResult<Envelope> {
        let id = envelope
            .id
            .get_or_insert_with(CorrelationId::generate)
            .clone();

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id.clone(), tx);

        if let Err(e) = self.transport.write_message(&envelope).await {
            self.pending.remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                tracing::warn!(id = %id, message_type = %envelope.message_type, "Request timed out");
                Err(ClientError::Timeout(self.config.request_timeout))
            }
        }
    }

    async fn call<T: DeserializeOwned>(&self, command: Command) -> ClientResult<T> {
        let expected = command.reply_type();
        let reply = self.request(command).await?;

        if let Some(expected) = expected
            && !reply.is(expected)
        {
            return Err(ClientError::UnexpectedReply {
                expected,
                actual: reply.message_type,
            });
        }
        Ok(reply.parse_data()?)
    }

    /// Receive host pushes and uncorrelated replies
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.event_tx.subscribe()
    }

    /// Requests still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Close the channel and stop the reader
    pub async fn close(&self) -> ClientResult<()> {
        self.transport.close().await?;
        self.reader.abort();
        self.pending.clear();
        Ok(())
    }

    // ========== Typed commands ==========

    pub async fn user_data(&self) -> ClientResult<UserDataResponse> {
        self.call(Command::UserDataRequest).await
    }

    pub async fn create_order(
        &self,
        order: OrderCreatedPayload,
    ) -> ClientResult<OrderCreatedResponse> {
        self.call(Command::OrderCreated(order)).await
    }

    pub async fn checkout(&self, data: Value) -> ClientResult<CheckoutResponse> {
        self.call(Command::CheckoutData(data)).await
    }

    pub async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        let response: FetchOrdersResponse = self.call(Command::FetchOrders).await?;
        Ok(response.orders)
    }

    pub async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        let response: FetchUsersResponse = self.call(Command::FetchUsers).await?;
        Ok(response.users)
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: &str,
    ) -> ClientResult<UpdateOrderStatusResponse> {
        self.call(Command::UpdateOrderStatus(UpdateOrderStatusPayload::new(
            order_id, new_status,
        )))
        .await
    }

    /// Run an admin action
    ///
    /// A failed sub-action still returns `Ok` with `success: false`.
    pub async fn admin(&self, action: AdminAction, data: Value) -> ClientResult<AdminActionResponse> {
        self.call(Command::AdminAction(AdminActionPayload::new(action, data)))
            .await
    }
}
