//! Memory transport (same-process)

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use super::Transport;
use crate::error::{AppError, AppResult};
use crate::message::Envelope;

/// In-process transport
///
/// Built in connected pairs: whatever one end writes, the other end reads,
/// in order. Closing one end makes the peer's reads fail with
/// `ClientDisconnected`.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Envelope>>>,
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<Envelope>>>>,
}

impl MemoryTransport {
    /// Create two connected ends (host side, frame side)
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        let a = Self {
            rx: Arc::new(Mutex::new(b_rx)),
            tx: Arc::new(Mutex::new(Some(a_tx))),
        };
        let b = Self {
            rx: Arc::new(Mutex::new(a_rx)),
            tx: Arc::new(Mutex::new(Some(b_tx))),
        };
        (a, b)
    }

    /// Non-blocking read, `None` when nothing is waiting
    pub async fn try_read_message(&self) -> Option<Envelope> {
        self.rx.lock().await.try_recv().ok()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> AppResult<Envelope> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or_else(AppError::client_disconnected)
    }

    async fn write_message(&self, msg: &Envelope) -> AppResult<()> {
        let tx = self.tx.lock().await;
        match tx.as_ref() {
            Some(tx) => tx
                .send(msg.clone())
                .map_err(|_| AppError::client_disconnected()),
            None => Err(AppError::transport("Memory transport closed")),
        }
    }

    async fn close(&self) -> AppResult<()> {
        self.tx.lock().await.take();
        Ok(())
    }
}
