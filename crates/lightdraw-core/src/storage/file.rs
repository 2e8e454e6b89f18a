//! File-based storage implementation for native platforms.

use super::{BoxFuture, PersistedCanvas, STORE_NAME, Storage, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-based storage for native platforms.
///
/// Each key is one JSON file in the base directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `base_path`. The directory is created by `open`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/lightdraw/canvasState/`
    /// On Windows: `%LOCALAPPDATA%\lightdraw\canvasState\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Unavailable("Could not determine data directory".to_string()))?;
        Ok(Self::new(base.join("lightdraw").join(STORE_NAME)))
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_key}.json"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn open(&self) -> BoxFuture<'_, StorageResult<()>> {
        Box::pin(async move {
            fs::create_dir_all(&self.base_path).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create {}: {e}", self.base_path.display()))
            })
        })
    }

    fn save(&self, key: &str, record: &PersistedCanvas) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(key);
        let json = match record.to_json() {
            Ok(j) => j,
            Err(e) => return Box::pin(async move { Err(e) }),
        };

        Box::pin(async move {
            // Readers only ever see a complete file.
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json)
                .and_then(|()| fs::rename(&tmp, &path))
                .map_err(|e| StorageError::WriteFailed(format!("Failed to write {}: {e}", path.display())))
        })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<Option<PersistedCanvas>>> {
        let path = self.record_path(key);

        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(StorageError::Io(format!("Failed to read {}: {e}", path.display()))),
            };
            PersistedCanvas::from_json(&json).map(Some).map_err(|e| {
                StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })
        })
    }

    fn clear(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.record_path(key);

        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(format!("Failed to delete {}: {e}", path.display()))),
            }
        })
    }
}
