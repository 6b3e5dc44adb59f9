//! Entity store
//!
//! The bus never talks to a database directly: orders and users are reached
//! through the [`EntityStore`] trait, a document store addressed by
//! `(collection, id)` whose records are JSON objects.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryStore`] | embedding, tests, `STORE_BACKEND=memory` |
//! | [`RedbStore`] | single-file persistence under `WORK_DIR` |

pub mod memory;
pub mod redb_store;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::AppError;
use thiserror::Error;

/// A stored document (always a JSON object with a string `id`)
pub type Record = Map<String, Value>;

/// Store error types
///
/// `NotFound` is only produced by `update`; `get` reports absence as `None`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        StoreError::Backend(msg.into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::not_found(format!("{}/{}", collection, id))
            }
            other => AppError::database(other.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction for [`Query::order_by`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Field ordering applied to query results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Collection query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    /// Every record, backend order
    pub fn all() -> Self {
        Self::default()
    }

    /// Every record, `createdAt` descending
    pub fn newest_first() -> Self {
        Self::default().order_by("createdAt", SortDirection::Descending)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort and truncate records fetched by a backend
    pub(crate) fn apply(&self, mut records: Vec<Record>) -> Vec<Record> {
        if let Some(order_by) = &self.order_by {
            records.sort_by(|a, b| {
                let ord = compare_values(a.get(&order_by.field), b.get(&order_by.field));
                match order_by.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }
}

/// Entity store trait
///
/// All operations may fail with [`StoreError::Backend`], which callers keep
/// distinct from "not found".
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch one record, `None` when absent
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Fetch every record of a collection
    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>>;

    /// Store a new record, assigning a uuid v4 `id` when it has none
    async fn insert(&self, collection: &str, record: Record) -> StoreResult<Record>;

    /// Shallow-merge `partial` into an existing record
    async fn update(&self, collection: &str, id: &str, partial: Record) -> StoreResult<Record>;
}

/// Read the record id, generating one when missing
pub(crate) fn ensure_id(record: &mut Record) -> String {
    let existing = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let id = existing.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    record.insert("id".to_string(), Value::String(id.clone()));
    id
}

/// Shallow merge; `id` is never overwritten
pub(crate) fn merge_partial(target: &mut Record, partial: Record) {
    for (key, value) in partial {
        if key == "id" {
            continue;
        }
        target.insert(key, value);
    }
}

/// Missing and null sort last in ascending order
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => compare_strings(x, y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// RFC 3339 timestamps compare chronologically, other strings lexically
fn compare_strings(a: &str, b: &str) -> Ordering {
    match (
        chrono::DateTime::parse_from_rfc3339(a),
        chrono::DateTime::parse_from_rfc3339(b),
    ) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_newest_first_orders_by_created_at() {
        let records = vec![
            record(json!({"id": "a", "createdAt": "2024-01-01T00:00:00Z"})),
            record(json!({"id": "b", "createdAt": "2024-03-01T00:00:00.5Z"})),
            record(json!({"id": "c", "createdAt": "2024-03-01T00:00:00Z"})),
        ];
        let sorted = Query::newest_first().apply(records);
        let ids: Vec<_> = sorted.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_field_sorts_last() {
        let records = vec![
            record(json!({"id": "x"})),
            record(json!({"id": "y", "n": 2})),
            record(json!({"id": "z", "n": 1})),
        ];
        let sorted = Query::all()
            .order_by("n", SortDirection::Ascending)
            .limit(2)
            .apply(records);
        let ids: Vec<_> = sorted.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["z", "y"]);
    }

    #[test]
    fn test_merge_keeps_id() {
        let mut target = record(json!({"id": "o1", "status": "pending", "total": 5}));
        merge_partial(
            &mut target,
            record(json!({"id": "other", "status": "shipped"})),
        );
        assert_eq!(target["id"], "o1");
        assert_eq!(target["status"], "shipped");
        assert_eq!(target["total"], 5);
    }

    #[test]
    fn test_ensure_id_generates_uuid() {
        let mut r = record(json!({"email": "a@b.c"}));
        let id = ensure_id(&mut r);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(r["id"], Value::String(id));

        let mut r = record(json!({"id": "keep"}));
        assert_eq!(ensure_id(&mut r), "keep");
    }
}
