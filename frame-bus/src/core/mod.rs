//! Core module: configuration, state and the TCP server
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - store, session and mailer shared by every bus
//! - [`Server`] - accept loop, one frame connection at a time

pub mod config;
pub mod server;
pub mod state;

pub use config::{Config, StoreBackend};
pub use server::Server;
pub use state::ServerState;
