//! Snapshot-based undo history.

use crate::document::CanvasDocument;

/// Default maximum number of undo states to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Undo stack of whole-document snapshots, each taken before a mutation.
///
/// There is no redo. When the stack is full the oldest snapshot is dropped.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<CanvasDocument>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Push a copy of `document` (call before making changes).
    pub fn push(&mut self, document: &CanvasDocument) {
        self.push_snapshot(document.clone());
    }

    /// Push a snapshot that was captured earlier, e.g. at gesture start.
    pub fn push_snapshot(&mut self, snapshot: CanvasDocument) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.limit {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the most recent snapshot. `None` when there is nothing to undo.
    pub fn pop(&mut self) -> Option<CanvasDocument> {
        self.undo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
    }
}
