//! Data models
//!
//! Typed views over the records kept in the entity store. Field names are
//! camelCase on the wire and in the store.

pub mod order;
pub mod user;

// Re-exports
pub use order::*;
pub use user::*;

/// Collection holding [`Order`] records
pub const ORDERS_COLLECTION: &str = "orders";
/// Collection holding [`User`] records
pub const USERS_COLLECTION: &str = "users";
