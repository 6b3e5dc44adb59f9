//! In-memory entity store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;

use super::{EntityStore, Query, Record, StoreError, StoreResult, ensure_id, merge_partial};

/// DashMap-backed store, one inner map per collection
///
/// Cloning shares the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, HashMap<String, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures into a collection
    pub fn seed<T: Serialize>(
        &self,
        collection: &str,
        items: impl IntoIterator<Item = T>,
    ) -> StoreResult<usize> {
        let mut entry = self.collections.entry(collection.to_string()).or_default();
        let mut count = 0;
        for item in items {
            let mut record = to_record(serde_json::to_value(item)?)?;
            let id = ensure_id(&mut record);
            entry.insert(id, record);
            count += 1;
        }
        Ok(count)
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

fn to_record(value: Value) -> StoreResult<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::backend(format!(
            "Records must be JSON objects, got: {}",
            other
        ))),
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.get(id).cloned()))
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let records = self
            .collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        Ok(query.apply(records))
    }

    async fn insert(&self, collection: &str, mut record: Record) -> StoreResult<Record> {
        let id = ensure_id(&mut record);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> StoreResult<Record> {
        let mut entries = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let record = entries
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        merge_partial(record, partial);
        Ok(record.clone())
    }
}
