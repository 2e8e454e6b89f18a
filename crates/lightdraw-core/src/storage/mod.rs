//! Storage abstraction for persistence.
//!
//! The canvas is a single-document model: one record, stored under
//! [`RECORD_KEY`], holds the viewport and every entity.

mod autosave;
mod memory;
mod record;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod indexeddb;

pub use autosave::{AutoSaveManager, PlatformAutoSaveManager, PlatformStorage, create_default_storage};
pub use memory::MemoryStorage;
pub use record::PersistedCanvas;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use indexeddb::IndexedDbStorage;

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Key of the one persisted record.
pub const RECORD_KEY: &str = "current";

/// Storage namespace (IndexedDB object store, directory name on disk).
pub const STORE_NAME: &str = "canvasState";

/// Storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The durable store could not be opened.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    /// Imported JSON did not describe a canvas record.
    #[error("malformed import: {0}")]
    MalformedImport(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    /// A save or load was attempted before [`AutoSaveManager::init`].
    #[error("storage not initialized")]
    NotInitialized,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for canvas record storage backends.
///
/// `open` must be idempotent. `load` yields `None` when nothing is stored
/// under the key.
///
/// On native platforms implementations must be Send + Sync.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    /// Open or create the underlying store.
    fn open(&self) -> BoxFuture<'_, StorageResult<()>>;

    /// Write a record, replacing any previous one under the same key.
    fn save(&self, key: &str, record: &PersistedCanvas) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<PersistedCanvas>>>;

    /// Delete a record. Deleting a missing record is not an error.
    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Trait for canvas record storage backends (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    /// Open or create the underlying store.
    fn open(&self) -> BoxFuture<'_, StorageResult<()>>;

    /// Write a record, replacing any previous one under the same key.
    fn save(&self, key: &str, record: &PersistedCanvas) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<PersistedCanvas>>>;

    /// Delete a record. Deleting a missing record is not an error.
    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}
