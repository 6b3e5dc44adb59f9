//! Channel adapter
//!
//! Wraps the raw cross-context primitive. A transport moves whole
//! [`Envelope`]s in delivery order and never retries:
//! ```text
//!         ┌────────────────────┐
//!         │   Transport Trait  │
//!         └────────┬───────────┘
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!    MemoryTransport   TcpTransport
//!    (same process)    (length-prefixed JSON)
//! ```

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{AppError, AppResult, ErrorCode};
use crate::message::{CorrelationId, Envelope};

/// Default upper bound for a single frame (1 MiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Transport trait
///
/// `read_message` is driven by exactly one receiver loop; `write_message`
/// may be called from any task.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Read the next inbound envelope
    async fn read_message(&self) -> AppResult<Envelope>;

    /// Transmit one envelope
    async fn write_message(&self, msg: &Envelope) -> AppResult<()>;

    /// Close the channel
    async fn close(&self) -> AppResult<()>;

    /// Remote address, when the channel has one
    fn peer_addr(&self) -> Option<String> {
        None
    }
}

// ========== Framing ==========

/// Read one length-prefixed JSON envelope
///
/// Layout: `len: u32 LE` then `len` bytes of UTF-8 JSON.
pub(crate) async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> AppResult<Envelope> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(AppError::client_disconnected());
        }
        Err(e) => return Err(AppError::transport(format!("Read len failed: {}", e))),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_frame_bytes {
        return Err(AppError::with_message(
            ErrorCode::FrameTooLarge,
            format!("Frame of {} bytes exceeds limit of {}", len, max_frame_bytes),
        ));
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| AppError::transport(format!("Read payload failed: {}", e)))?;

    Envelope::from_bytes(&payload).map_err(|e| {
        let err = AppError::invalid_payload(format!("Malformed envelope: {}", e));
        match CorrelationId::recover(&payload) {
            Some(id) => id.attach(err),
            None => err,
        }
    })
}

/// Write one length-prefixed JSON envelope
pub(crate) async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &Envelope,
    max_frame_bytes: usize,
) -> AppResult<()> {
    let payload = msg.to_bytes()?;
    if payload.len() > max_frame_bytes {
        return Err(AppError::with_message(
            ErrorCode::FrameTooLarge,
            format!(
                "Frame of {} bytes exceeds limit of {}",
                payload.len(),
                max_frame_bytes
            ),
        ));
    }

    let mut data = Vec::with_capacity(4 + payload.len());
    data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    data.extend_from_slice(&payload);

    writer
        .write_all(&data)
        .await
        .map_err(|e| AppError::transport(format!("Write failed: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::transport(format!("Flush failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use serde_json::json;

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let env = Envelope::request(MessageType::FetchOrders, json!({}), "r1");

        write_frame(&mut a, &env, DEFAULT_MAX_FRAME_BYTES)
            .await
            .unwrap();
        let received = read_frame(&mut b, DEFAULT_MAX_FRAME_BYTES).await.unwrap();
        assert_eq!(received, env);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        a.write_all(&(10_000u32).to_le_bytes()).await.unwrap();

        let err = read_frame(&mut b, 1024).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::FrameTooLarge);
    }

    #[tokio::test]
    async fn test_malformed_envelope_keeps_recoverable_id() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        for raw in [&br#"{"type": 12, "id": 0.5}"#[..], &b"{oops"[..]] {
            a.write_all(&(raw.len() as u32).to_le_bytes()).await.unwrap();
            a.write_all(raw).await.unwrap();
        }

        let err = read_frame(&mut b, 1024).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PayloadDecodeFailed);
        assert_eq!(
            CorrelationId::from_error(&err),
            Some(serde_json::from_str("0.5").unwrap())
        );

        let err = read_frame(&mut b, 1024).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PayloadDecodeFailed);
        assert_eq!(CorrelationId::from_error(&err), None);
    }

    #[tokio::test]
    async fn test_eof_is_disconnect() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        let err = read_frame(&mut b, 1024).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientDisconnected);
    }
}
