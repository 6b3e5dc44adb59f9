//! Readiness gate
//!
//! The frame may attach its listener long after the host starts talking.
//! Until `IFRAME_READY` arrives every outbound envelope is parked in a FIFO
//! queue; the first `IFRAME_READY` flushes the queue in order and from then
//! on envelopes go straight to the transport. The latch never resets.
//!
//! Enqueue, flush and direct sends share one lock, so an envelope delivered
//! while the queue is draining waits behind it.
//!
//! A correlated reply the transport refuses before it reaches the wire
//! (too large for a frame, or not encodable) is replaced by an `ERROR`
//! with the same id, so the request is still answered once.

use std::collections::VecDeque;
use std::sync::Arc;

use shared::message::Envelope;
use shared::{AppError, AppResult, ErrorCode};
use shared::transport::Transport;
use tokio::sync::Mutex;

enum GateState {
    NotReady(VecDeque<Envelope>),
    Ready,
}

pub struct ReadinessGate {
    transport: Arc<dyn Transport>,
    state: Mutex<GateState>,
}

impl std::fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl ReadinessGate {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Mutex::new(GateState::NotReady(VecDeque::new())),
        }
    }

    /// Send now if ready, otherwise queue
    ///
    /// A queued envelope reports success; its transmit result is only
    /// logged when the queue is flushed.
    pub async fn deliver(&self, envelope: Envelope) -> AppResult<()> {
        let mut state = self.state.lock().await;
        match &mut *state {
            GateState::NotReady(pending) => {
                tracing::debug!(
                    message_type = %envelope.message_type,
                    queued = pending.len() + 1,
                    "Frame not ready, queueing envelope"
                );
                pending.push_back(envelope);
                Ok(())
            }
            GateState::Ready => self.transmit(&envelope).await,
        }
    }

    /// Write one envelope, falling back to an `ERROR` for rejected replies
    async fn transmit(&self, envelope: &Envelope) -> AppResult<()> {
        let err = match self.transport.write_message(envelope).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        if !rejected_before_send(&err) || envelope.is_error() {
            return Err(err);
        }
        let Some(id) = envelope.id.clone() else {
            return Err(err);
        };

        tracing::warn!(
            message_type = %envelope.message_type,
            id = %id,
            error = %err,
            "Reply rejected by transport, answering with error"
        );
        self.transport
            .write_message(&Envelope::error(Some(id), err.message))
            .await
    }

    /// Latch the gate and flush the queue
    ///
    /// Returns `false` when the gate was already open.
    pub async fn open(&self) -> bool {
        let mut state = self.state.lock().await;
        let pending = match std::mem::replace(&mut *state, GateState::Ready) {
            GateState::NotReady(pending) => pending,
            GateState::Ready => return false,
        };

        let total = pending.len();
        let mut failed = 0usize;
        for envelope in pending {
            if let Err(e) = self.transmit(&envelope).await {
                failed += 1;
                tracing::warn!(
                    message_type = %envelope.message_type,
                    error = %e,
                    "Failed to flush queued envelope"
                );
            }
        }
        tracing::info!(flushed = total - failed, failed, "Frame ready, pending queue drained");
        true
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.lock().await, GateState::Ready)
    }

    /// Envelopes waiting for readiness
    pub async fn pending_len(&self) -> usize {
        match &*self.state.lock().await {
            GateState::NotReady(pending) => pending.len(),
            GateState::Ready => 0,
        }
    }
}

/// Failures raised locally, before any byte was written
fn rejected_before_send(err: &AppError) -> bool {
    matches!(
        err.code,
        ErrorCode::FrameTooLarge | ErrorCode::PayloadDecodeFailed
    )
}
