//! A canvas wired to durable storage.

use crate::camera::Viewport;
use crate::canvas::{Canvas, CanvasChange};
use crate::commands::Command;
use crate::config::CanvasConfig;
use crate::storage::{AutoSaveManager, PersistedCanvas, Storage, StorageError, StorageResult};
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;

/// Owns the live [`Canvas`] and its [`AutoSaveManager`].
///
/// The host drives it: feed input to [`Session::canvas_mut`], then call
/// [`Session::tick`] once per frame or timer callback.
pub struct Session<S: Storage> {
    canvas: Canvas,
    autosave: AutoSaveManager<S>,
    last_error: Option<StorageError>,
}

impl<S: Storage> Session<S> {
    pub fn new(config: CanvasConfig, storage: Arc<S>) -> Self {
        let autosave = AutoSaveManager::new(storage).with_quiet_period(config.autosave_quiet_period());
        Self {
            canvas: Canvas::new(config),
            autosave,
            last_error: None,
        }
    }

    /// Open storage and restore the saved canvas, if any.
    ///
    /// Returns whether a record was restored. When storage cannot be opened
    /// the error is returned but the session stays usable in memory.
    pub async fn start(&mut self) -> StorageResult<bool> {
        self.autosave.init().await?;
        self.load().await
    }

    /// Replace the live canvas with the stored record.
    pub async fn load(&mut self) -> StorageResult<bool> {
        let Some(record) = self.autosave.load().await? else {
            return Ok(false);
        };
        let (document, viewport) = record.into_parts();
        self.canvas.restore(document, viewport);
        Ok(true)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn autosave(&self) -> &AutoSaveManager<S> {
        &self.autosave
    }

    pub fn is_saving(&self) -> bool {
        self.autosave.is_saving()
    }

    /// The most recent storage failure seen by [`Session::tick`].
    pub fn last_error(&self) -> Option<&StorageError> {
        self.last_error.as_ref()
    }

    /// Drain canvas changes, schedule a save for persistent ones and write
    /// if the quiet period has elapsed. Returns the drained changes so the
    /// host can redraw.
    pub async fn tick(&mut self, now: Instant) -> Vec<CanvasChange> {
        let changes = self.canvas.drain_changes();
        if changes.iter().any(CanvasChange::is_persistent) {
            self.autosave.notify_change(now);
        }
        let canvas = &self.canvas;
        let saved = self
            .autosave
            .save_if_due(now, || PersistedCanvas::from_canvas(canvas))
            .await;
        match saved {
            Ok(true) => self.last_error = None,
            Ok(false) => {}
            Err(e) => self.last_error = Some(e),
        }
        changes
    }

    /// Write a scheduled save immediately.
    pub async fn flush(&mut self) -> StorageResult<()> {
        if !self.autosave.is_pending() {
            return Ok(());
        }
        self.autosave.save(&PersistedCanvas::from_canvas(&self.canvas)).await
    }

    /// Run a command. `ClearAll` also deletes the stored record.
    pub async fn dispatch(&mut self, command: Command) -> StorageResult<bool> {
        if command == Command::ClearAll {
            self.clear_all().await?;
            return Ok(true);
        }
        Ok(self.canvas.dispatch(command))
    }

    /// Empty canvas, default viewport, no history, nothing stored.
    pub async fn clear_all(&mut self) -> StorageResult<()> {
        self.canvas.reset();
        self.autosave.clear().await
    }

    /// Pretty JSON of the current canvas as stored.
    pub async fn export_json(&mut self) -> StorageResult<String> {
        self.flush().await?;
        match self.autosave.export_json().await {
            Ok(Some(json)) => Ok(json),
            Ok(None) | Err(StorageError::Unavailable(_)) => {
                PersistedCanvas::from_canvas(&self.canvas).to_json_pretty()
            }
            Err(e) => Err(e),
        }
    }

    /// Validate, store and show an exported record. The canvas is left
    /// untouched when the JSON is rejected or cannot be written.
    pub async fn import_json(&mut self, json: &str) -> StorageResult<()> {
        let record = self.autosave.import_json(json).await?;
        let (document, viewport) = record.into_parts();
        self.canvas.restore(document, viewport);
        Ok(())
    }

    /// Reset only the viewport, keeping entities.
    pub fn reset_viewport(&mut self) {
        self.canvas.set_viewport(Viewport::default());
    }

    /// Write any pending change, then stop saving.
    pub async fn shutdown(mut self) -> StorageResult<Canvas> {
        let flushed = self.flush().await;
        self.autosave.shutdown();
        flushed.map(|()| self.canvas)
    }
}
