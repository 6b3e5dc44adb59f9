//! TCP transport

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use super::{DEFAULT_MAX_FRAME_BYTES, Transport, read_frame, write_frame};
use crate::error::{AppError, AppResult};
use crate::message::Envelope;

/// TCP transport carrying length-prefixed JSON envelopes
#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    addr: Option<String>,
    max_frame_bytes: usize,
}

impl TcpTransport {
    /// Connect to the given address
    pub async fn connect(addr: &str) -> AppResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| AppError::transport(format!("TCP connect failed: {}", e)))?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an accepted stream
    pub fn from_stream(stream: TcpStream) -> Self {
        let peer_addr = stream.peer_addr().ok().map(|a| a.to_string());
        let (reader, writer) = stream.into_split();
        Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
            addr: peer_addr,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }

    pub fn with_max_frame_bytes(mut self, max_frame_bytes: usize) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> AppResult<Envelope> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader, self.max_frame_bytes).await
    }

    async fn write_message(&self, msg: &Envelope) -> AppResult<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, msg, self.max_frame_bytes).await
    }

    async fn close(&self) -> AppResult<()> {
        let mut writer = self.writer.lock().await;
        writer
            .shutdown()
            .await
            .map_err(|e| AppError::transport(format!("TCP close failed: {}", e)))?;
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        self.addr.clone()
    }
}
