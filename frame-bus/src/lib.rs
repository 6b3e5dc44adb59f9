//! Frame Bus - host side of the cross-boundary command bus
//!
//! An embedded frame and its host only exchange opaque envelopes. This
//! crate is the host end: it waits for the frame to announce readiness,
//! routes typed commands to handlers, validates order status changes
//! against the entity store and guarantees one reply per request.
//!
//! # Module layout
//!
//! ```text
//! frame-bus/src/
//! ├── core/          # config, server state, TCP server
//! ├── message/       # bus loop, readiness gate, router, emitter
//! ├── handlers/      # one handler per command, admin sub-router
//! ├── orders/        # order lifecycle validator
//! ├── db/            # entity store trait, memory + redb backends, repositories
//! ├── services/      # session and mailer collaborators
//! └── utils/         # logging
//! ```

pub mod core;
pub mod db;
pub mod handlers;
pub mod message;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState, StoreBackend};
pub use db::{EntityStore, MemoryStore, RedbStore, StoreError};
pub use message::{CommandHandler, DispatchRouter, Emitter, FrameBus, Reply, RequestContext};
pub use services::{LogMailer, Mailer, SessionState};
pub use shared::{AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
    ______                            ____
   / ____/________ _____ ___  ___    / __ )__  _______
  / /_  / ___/ __ `/ __ `__ \/ _ \  / __  / / / / ___/
 / __/ / /  / /_/ / / / / / /  __/ / /_/ / /_/ (__  )
/_/   /_/   \__,_/_/ /_/ /_/\___/ /_____/\__,_/____/
    "#
    );
}
