//! In-memory storage implementation.

use super::{BoxFuture, PersistedCanvas, Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory storage for testing and ephemeral use.
///
/// Failures can be switched on to exercise error paths.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<String, PersistedCanvas>>,
    fail_open: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `open` always fails, like a browser with storage disabled.
    pub fn unavailable() -> Self {
        let storage = Self::default();
        storage.fail_open.store(true, Ordering::SeqCst);
        storage
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Io(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn open(&self) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            if self.fail_open.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("memory store disabled".to_string()));
            }
            Ok(())
        })
    }

    fn save(&self, key: &str, record: &PersistedCanvas) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let record = record.clone();
        Box::pin(async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::WriteFailed("memory store rejected write".to_string()));
            }
            self.records.write().map_err(lock_error)?.insert(key, record);
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<PersistedCanvas>>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.records.read().map_err(lock_error)?.get(&key).cloned()) })
    }

    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            self.records.write().map_err(lock_error)?.remove(&key);
            Ok(())
        })
    }
}
