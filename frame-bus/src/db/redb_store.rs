//! redb-backed entity store
//!
//! # Tables
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `entities` | `(collection, id)` | JSON-serialized record |
//!
//! Each store operation runs in its own transaction on tokio's blocking
//! pool. Updates read and write inside one write transaction so concurrent
//! merges never lose fields.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::{EntityStore, Query, Record, StoreError, StoreResult, ensure_id, merge_partial};

/// Every collection lives in one table, keyed by `(collection, id)`
const ENTITIES_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("entities");

fn backend<E: Into<redb::Error>>(err: E) -> StoreError {
    StoreError::Backend(err.into().to_string())
}

/// Persistent store on a single redb file
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database file
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path.as_ref()).map_err(backend)?;
        Self::init(db)
    }

    /// Store without a backing file (tests)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(backend)?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write().map_err(backend)?;
        {
            let _ = write_txn.open_table(ENTITIES_TABLE).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn decode(bytes: &[u8]) -> StoreResult<Record> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Run a transaction on the blocking pool
    ///
    /// Commits fsync; on the current-thread runtime they would otherwise
    /// stall the bus loop.
    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StoreError::Backend(format!("Store task failed: {}", e)))?
    }
}

#[async_trait]
impl EntityStore for RedbStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(backend)?;
            let table = read_txn.open_table(ENTITIES_TABLE).map_err(backend)?;
            let guard = table.get((collection.as_str(), id.as_str())).map_err(backend)?;
            guard.map(|g| Self::decode(g.value())).transpose()
        })
        .await
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>> {
        let collection = collection.to_string();
        let records = self
            .blocking(move |db| {
                let read_txn = db.begin_read().map_err(backend)?;
                let table = read_txn.open_table(ENTITIES_TABLE).map_err(backend)?;

                let mut records = Vec::new();
                for entry in table.range((collection.as_str(), "")..).map_err(backend)? {
                    let (key, value) = entry.map_err(backend)?;
                    if key.value().0 != collection {
                        break;
                    }
                    records.push(Self::decode(value.value())?);
                }
                Ok(records)
            })
            .await?;
        Ok(query.apply(records))
    }

    async fn insert(&self, collection: &str, mut record: Record) -> StoreResult<Record> {
        let collection = collection.to_string();
        let id = ensure_id(&mut record);
        let bytes = serde_json::to_vec(&record)?;

        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(backend)?;
            {
                let mut table = write_txn.open_table(ENTITIES_TABLE).map_err(backend)?;
                table
                    .insert((collection.as_str(), id.as_str()), bytes.as_slice())
                    .map_err(backend)?;
            }
            write_txn.commit().map_err(backend)
        })
        .await?;
        Ok(record)
    }

    async fn update(&self, collection: &str, id: &str, partial: Record) -> StoreResult<Record> {
        let (collection, id) = (collection.to_string(), id.to_string());
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(backend)?;
            let record = {
                let mut table = write_txn.open_table(ENTITIES_TABLE).map_err(backend)?;
                let key = (collection.as_str(), id.as_str());
                let mut record = match table.get(key).map_err(backend)? {
                    Some(guard) => Self::decode(guard.value())?,
                    None => return Err(StoreError::not_found(&collection, &id)),
                };
                merge_partial(&mut record, partial);
                let bytes = serde_json::to_vec(&record)?;
                table.insert(key, bytes.as_slice()).map_err(backend)?;
                record
            };
            write_txn.commit().map_err(backend)?;
            Ok(record)
        })
        .await
    }
}
