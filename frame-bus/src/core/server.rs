//! Server Implementation
//!
//! Accepts frame connections over TCP and serves them one at a time. Each
//! connection gets a fresh [`FrameBus`], so readiness and the pending queue
//! never carry over between frames.

use std::sync::Arc;

use shared::transport::{TcpTransport, Transport};
use shared::{AppError, AppResult};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::{Config, ServerState};
use crate::message::FrameBus;

pub struct Server {
    config: Config,
    state: ServerState,
    shutdown_token: CancellationToken,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancel to stop accepting and end the active bus
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Bind `listen_addr` and serve until shutdown
    pub async fn run(&self) -> AppResult<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .map_err(|e| {
                AppError::transport(format!("Failed to bind {}: {}", self.config.listen_addr, e))
            })?;
        self.serve(listener).await
    }

    /// Serve an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> AppResult<()> {
        let local = listener.local_addr().ok();
        tracing::info!(addr = ?local, "Frame bus listening");

        loop {
            let accepted = tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, addr)) => {
                    tracing::info!(peer = %addr, "Frame connected");
                    let transport = TcpTransport::from_stream(stream)
                        .with_max_frame_bytes(self.config.max_frame_bytes);
                    if let Err(e) = self.serve_connection(Arc::new(transport)).await {
                        tracing::warn!(peer = %addr, error = %e, "Frame session ended with error");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Accept failed"),
            }
        }

        tracing::info!("Frame bus server stopped");
        Ok(())
    }

    /// Run one bus over `transport` until the frame leaves
    pub async fn serve_connection(&self, transport: Arc<dyn Transport>) -> AppResult<()> {
        FrameBus::new(transport, self.state.router())
            .with_shutdown_token(self.shutdown_token.child_token())
            .run()
            .await
    }
}
