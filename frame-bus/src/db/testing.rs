//! Store double that records calls and injects failures

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EntityStore, MemoryStore, Query, Record, StoreError, StoreResult};

#[derive(Debug, Default)]
pub(crate) struct RecordingStore {
    pub inner: MemoryStore,
    pub gets: AtomicUsize,
    pub queries: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: Mutex<Vec<(String, String, Record)>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn update_calls(&self) -> Vec<(String, String, Record)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
            + self.queries.load(Ordering::SeqCst)
            + self.inserts.load(Ordering::SeqCst)
            + self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl EntityStore for RecordingStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("connection reset"));
        }
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend("connection reset"));
        }
        self.inner.query(collection, query).await
    }

    async fn insert(&self, collection: &str, record: Record) -> StoreResult<Record> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> StoreResult<Record> {
        self.updates.lock().unwrap().push((
            collection.to_string(),
            id.to_string(),
            partial.clone(),
        ));
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend("disk full"));
        }
        self.inner.update(collection, id, partial).await
    }
}
