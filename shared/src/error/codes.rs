//! Unified error codes for the frame bus
//!
//! Error codes are shared by the host bus, the frame client and anything
//! that inspects `ERROR` envelopes. They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Protocol errors
//! - 4xxx: Order errors
//! - 8xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for compact serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Protocol ====================
    /// Envelope type is not in the catalog or has no handler
    UnknownMessageType = 1001,
    /// Admin sub-command is not recognized
    UnknownAdminAction = 1002,
    /// Envelope payload does not match the command shape
    PayloadDecodeFailed = 1003,
    /// Frame exceeds the configured maximum size
    FrameTooLarge = 1004,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status value outside the order lifecycle
    InvalidStatus = 4002,

    // ==================== 8xxx: User ====================
    /// User not found
    UserNotFound = 8001,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    TimeoutError = 9004,
    /// A handler panicked while serving a request
    HandlerPanicked = 9006,
    /// Remote side closed the channel
    ClientDisconnected = 9301,
    /// Channel read/write failure
    TransportError = 9302,
    /// Outbound mail could not be handed off
    MailerError = 9303,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::RequiredField => "Required field is missing",

            // Protocol
            ErrorCode::UnknownMessageType => "Unknown message type",
            ErrorCode::UnknownAdminAction => "Unknown admin action",
            ErrorCode::PayloadDecodeFailed => "Invalid message payload",
            ErrorCode::FrameTooLarge => "Frame too large",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatus => "Invalid order status",

            // User
            ErrorCode::UserNotFound => "User not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Request timed out",
            ErrorCode::HandlerPanicked => "Handler panicked",
            ErrorCode::ClientDisconnected => "Client disconnected",
            ErrorCode::TransportError => "Transport error",
            ErrorCode::MailerError => "Failed to send email",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            7 => Ok(ErrorCode::RequiredField),

            // Protocol
            1001 => Ok(ErrorCode::UnknownMessageType),
            1002 => Ok(ErrorCode::UnknownAdminAction),
            1003 => Ok(ErrorCode::PayloadDecodeFailed),
            1004 => Ok(ErrorCode::FrameTooLarge),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatus),

            // User
            8001 => Ok(ErrorCode::UserNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9006 => Ok(ErrorCode::HandlerPanicked),
            9301 => Ok(ErrorCode::ClientDisconnected),
            9302 => Ok(ErrorCode::TransportError),
            9303 => Ok(ErrorCode::MailerError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
