//! Client error types

use std::time::Duration;

use shared::AppError;
use shared::message::MessageType;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// The channel to the host failed
    #[error("Transport error: {0}")]
    Transport(#[from] AppError),

    /// The host answered with an `ERROR` envelope
    #[error("Remote error: {0}")]
    Remote(String),

    /// No reply within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The connection closed while waiting for a reply
    #[error("Connection closed")]
    Closed,

    /// The host answered with a different type than the command expects
    #[error("Unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: MessageType,
        actual: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Error text sent by the host, if this is a remote error
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            ClientError::Remote(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
