//! Debounced auto-save of the canvas record.
//!
//! The manager owns a single deadline. Every change pushes the deadline to
//! `now + quiet_period`; the host polls [`AutoSaveManager::is_due`] from its
//! frame or timer callback and writes once the canvas has been quiet long
//! enough. A burst of changes therefore produces one write.

use super::{PersistedCanvas, RECORD_KEY, Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Default quiet period before a pending change is written.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Availability {
    Uninitialized,
    Ready,
    /// `open` failed; the canvas keeps working in memory only.
    Fallback,
}

/// Manages debounced persistence of the single canvas record.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    availability: Availability,
    quiet_period: Duration,
    /// When the pending save becomes due. `None` means nothing is scheduled.
    deadline: Option<Instant>,
    saving: Arc<AtomicBool>,
    last_saved: Option<i64>,
    shut_down: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            availability: Availability::Uninitialized,
            quiet_period: DEFAULT_QUIET_PERIOD,
            deadline: None,
            saving: Arc::new(AtomicBool::new(false)),
            last_saved: None,
            shut_down: false,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Open the backend. Safe to call repeatedly.
    ///
    /// On failure the manager switches to in-memory operation: changes are
    /// no longer scheduled and `load` finds nothing. The error is still
    /// returned so the host can tell the user.
    pub async fn init(&mut self) -> StorageResult<()> {
        if self.availability == Availability::Ready {
            return Ok(());
        }
        match self.storage.open().await {
            Ok(()) => {
                self.availability = Availability::Ready;
                log::info!("canvas storage opened");
                Ok(())
            }
            Err(e) => {
                self.availability = Availability::Fallback;
                log::warn!("canvas storage unavailable, continuing in memory: {e}");
                Err(match e {
                    StorageError::Unavailable(_) => e,
                    other => StorageError::Unavailable(other.to_string()),
                })
            }
        }
    }

    /// Whether writes reach durable storage.
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Ready && !self.shut_down
    }

    /// Record that the canvas changed at `now`, restarting the quiet period.
    pub fn notify_change(&mut self, now: Instant) {
        if self.is_available() {
            self.deadline = Some(now + self.quiet_period);
        }
    }

    /// Whether a save is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the scheduled save should run at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Drop the scheduled save without writing.
    pub fn cancel_pending(&mut self) {
        self.deadline = None;
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    /// Shared flag for a "Saving…" indicator, readable while a save runs.
    pub fn saving_indicator(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.saving)
    }

    /// `lastSaved` of the most recent successful write.
    pub fn last_saved(&self) -> Option<i64> {
        self.last_saved
    }

    /// Write `record` now, clearing any scheduled save.
    ///
    /// A failed write is logged and returned; nothing is retried until the
    /// next change schedules another save.
    pub async fn save(&mut self, record: &PersistedCanvas) -> StorageResult<()> {
        self.ensure_ready()?;
        self.deadline = None;
        self.saving.store(true, Ordering::SeqCst);
        let result = self.storage.save(RECORD_KEY, record).await;
        self.saving.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.last_saved = Some(record.last_saved);
                log::info!(
                    "canvas saved ({} shapes, {} connectors, {} groups)",
                    record.shapes.len(),
                    record.connectors.len(),
                    record.groups.len()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("canvas save failed: {e}");
                Err(match e {
                    StorageError::WriteFailed(_) => e,
                    other => StorageError::WriteFailed(other.to_string()),
                })
            }
        }
    }

    /// Save if the quiet period has elapsed. `record` is only built when a
    /// write actually happens. Returns whether a write was attempted.
    pub async fn save_if_due(
        &mut self,
        now: Instant,
        record: impl FnOnce() -> PersistedCanvas,
    ) -> StorageResult<bool> {
        if !self.is_due(now) {
            return Ok(false);
        }
        self.save(&record()).await?;
        Ok(true)
    }

    /// The stored record, or `None` if nothing was saved yet. In-memory
    /// fallback mode never finds a record.
    pub async fn load(&mut self) -> StorageResult<Option<PersistedCanvas>> {
        match self.availability {
            Availability::Uninitialized => return Err(StorageError::NotInitialized),
            Availability::Fallback => return Ok(None),
            Availability::Ready => {}
        }
        let record = self.storage.load(RECORD_KEY).await?;
        if let Some(record) = &record {
            log::info!("canvas loaded (saved at {})", record.last_saved);
            self.last_saved = Some(record.last_saved);
        }
        Ok(record)
    }

    /// Delete the stored record and any scheduled save.
    pub async fn clear(&mut self) -> StorageResult<()> {
        self.deadline = None;
        if self.availability == Availability::Fallback {
            return Ok(());
        }
        self.ensure_ready()?;
        self.storage.clear(RECORD_KEY).await?;
        self.last_saved = None;
        log::info!("canvas storage cleared");
        Ok(())
    }

    /// Pretty-printed JSON of the stored record.
    pub async fn export_json(&mut self) -> StorageResult<Option<String>> {
        match self.load().await? {
            Some(record) => record.to_json_pretty().map(Some),
            None => Ok(None),
        }
    }

    /// Validate `json` and store it as the current record.
    ///
    /// Malformed input is rejected before anything is written.
    pub async fn import_json(&mut self, json: &str) -> StorageResult<PersistedCanvas> {
        let record = PersistedCanvas::parse_import(json).inspect_err(|e| log::warn!("import rejected: {e}"))?;
        self.save(&record).await?;
        Ok(record)
    }

    /// Stop scheduling saves. A pending save is dropped.
    pub fn shutdown(&mut self) {
        self.deadline = None;
        self.shut_down = true;
        log::debug!("autosave shut down");
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn ensure_ready(&self) -> StorageResult<()> {
        match self.availability {
            Availability::Ready if !self.shut_down => Ok(()),
            Availability::Fallback => Err(StorageError::Unavailable("running in memory".to_string())),
            _ => Err(StorageError::NotInitialized),
        }
    }
}

/// Create a platform-appropriate storage backend.
#[cfg(not(target_arch = "wasm32"))]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::FileStorage>> {
    Ok(Arc::new(crate::storage::FileStorage::default_location()?))
}

#[cfg(target_arch = "wasm32")]
pub fn create_default_storage() -> StorageResult<Arc<crate::storage::IndexedDbStorage>> {
    Ok(Arc::new(crate::storage::IndexedDbStorage::new()))
}

/// Convenience type alias for platform-specific storage.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformStorage = crate::storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub type PlatformStorage = crate::storage::IndexedDbStorage;

/// Type alias for the auto-save manager with platform-specific storage.
pub type PlatformAutoSaveManager = AutoSaveManager<PlatformStorage>;
