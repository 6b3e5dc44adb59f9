//! Shared types for the frame bus
//!
//! Protocol types used by both sides of the boundary: the envelope and
//! message catalog, typed payloads, the error system, entity models and the
//! channel adapter (transports).

pub mod error;
pub mod message;
pub mod models;
#[cfg(feature = "transport")]
pub mod transport;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use message::{Command, CorrelationId, Envelope, MessageType};
