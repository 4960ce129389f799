//! Key-value storage for cart state
//!
//! # Scopes
//!
//! | Scope | Backing | Keys |
//! |-------|---------|------|
//! | durable | `RedbStore` | `cart`, `customer` (name + address), `payment`, `theme` |
//! | session | `MemoryStore` | `customer_phones`, `scheduled_order` |
//!
//! Phone numbers and the scheduling marker are deliberately
//! session-scoped: a fresh process starts without them, while the
//! delivery address survives restarts.
//!
//! Storage failures are never fatal to the store; callers log them and
//! keep operating on the in-memory state for the rest of the session.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use thiserror::Error;

/// Single kv table: key = scope key, value = JSON-serialized record
const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key-value storage
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
    fn clear(&self) -> StorageResult<()>;
}

/// In-memory store; session scope and tests
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.map.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.map.lock().clear();
        Ok(())
    }
}

/// Durable store backed by redb
///
/// redb commits with `Durability::Immediate` by default: once `set`
/// returns, the write survives process loss. The database file stays
/// consistent across crashes (copy-on-write with atomic pointer swap).
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;

        // Create the table if it doesn't exist
        let txn = db.begin_write()?;
        {
            txn.open_table(KV_TABLE)?;
        }
        txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        Ok(table.get(key)?.map(|v| v.value().to_string()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(KV_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(KV_TABLE)?;
        {
            txn.open_table(KV_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }
}
