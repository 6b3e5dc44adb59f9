//! Server state
//!
//! Everything a bus needs that outlives a single frame connection.

use std::sync::Arc;

use shared::{AppError, AppResult};

use super::config::{Config, StoreBackend};
use crate::db::{EntityStore, MemoryStore, RedbStore};
use crate::handlers;
use crate::message::DispatchRouter;
use crate::services::{LogMailer, Mailer, SessionState};

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn EntityStore>,
    pub session: SessionState,
    pub mailer: Arc<dyn Mailer>,
}

impl ServerState {
    pub fn new(config: Config, store: Arc<dyn EntityStore>) -> Self {
        Self {
            config,
            store,
            session: SessionState::new(),
            mailer: Arc::new(LogMailer),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = session;
        self
    }

    /// Open the configured store
    pub fn initialize(config: &Config) -> AppResult<Self> {
        let store: Arc<dyn EntityStore> = match config.store_backend {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory entity store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Redb => {
                std::fs::create_dir_all(&config.work_dir).map_err(|e| {
                    AppError::internal(format!("Failed to create {}: {}", config.work_dir, e))
                })?;
                let path = config.database_path();
                tracing::info!(path = %path.display(), "Opening redb entity store");
                Arc::new(RedbStore::open(&path)?)
            }
        };
        Ok(Self::new(config.clone(), store))
    }

    /// Router with the built-in handlers, ready for a new bus
    pub fn router(&self) -> DispatchRouter {
        handlers::default_router(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::MessageType;

    #[test]
    fn test_router_covers_every_request_type() {
        let state = ServerState::new(
            Config::with_overrides("/tmp/unused", "127.0.0.1:0"),
            Arc::new(MemoryStore::new()),
        );
        let router = state.router();
        for t in [
            MessageType::UserDataRequest,
            MessageType::OrderCreated,
            MessageType::CheckoutData,
            MessageType::FetchOrders,
            MessageType::FetchUsers,
            MessageType::UpdateOrderStatus,
            MessageType::AdminAction,
        ] {
            assert!(router.handles(t), "{} not registered", t);
        }
        assert!(!router.handles(MessageType::IframeReady));
        assert_eq!(router.handler_count(), 7);
    }

    #[test]
    fn test_initialize_redb() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::with_overrides(
            dir.path().join("nested").to_string_lossy().to_string(),
            "127.0.0.1:0",
        );
        config.store_backend = StoreBackend::Redb;
        ServerState::initialize(&config).unwrap();
        assert!(config.database_path().exists());
    }
}
