//! Unified error system for the frame bus
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ErrorPayload`]: The `{ "error": ... }` body of `ERROR` envelopes
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Protocol errors
//! - 4xxx: Order errors
//! - 8xxx: User errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorPayload};
//!
//! let err = AppError::with_message(ErrorCode::OrderNotFound, "Order not found: o1");
//! let payload = ErrorPayload::from(&err);
//! assert_eq!(payload.error, "Order not found: o1");
//! ```

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult, ErrorPayload};
