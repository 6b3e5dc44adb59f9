//! Repository Module
//!
//! Typed access to the `orders` and `users` collections on top of an
//! [`EntityStore`](super::EntityStore).

pub mod order;
pub mod user;

// Re-exports
pub use order::OrderRepository;
pub use user::UserRepository;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{EntityStore, Record, StoreError, StoreResult};

/// Shared plumbing for the typed repositories
#[derive(Clone)]
pub struct BaseRepository {
    store: Arc<dyn EntityStore>,
}

impl BaseRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }
}

/// Record -> typed model
pub(crate) fn decode<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Typed model -> record
pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::backend("Model did not serialize to an object")),
    }
}
