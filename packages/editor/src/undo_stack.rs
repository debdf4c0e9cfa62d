//! # Undo/Redo Stack
//!
//! Snapshot-based history for controller edits.
//!
//! ## Design
//!
//! - Each entry stores the whole document before the edit, captured
//!   before the domain is touched
//! - The document after the edit is captured lazily on the entry's first
//!   `redo`, which happens when it is pushed
//! - Undo and redo replace the whole document with the stored snapshot
//! - New entries clear the redo stack
//! - Batches merge consecutive entries into one step: first `before`,
//!   last `after`
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = SnapshotUndoStack::new();
//!
//! // Capture, edit, then record
//! let entry = SnapshotEntry::new(target.capture()?);
//! edit(&mut target)?;
//! stack.push(entry, &mut target)?;
//!
//! // Undo
//! stack.undo(&mut target)?;
//!
//! // Redo
//! stack.redo(&mut target)?;
//! ```

use crate::errors::EditorError;

/// Something whose whole state can be captured and restored as text
pub trait SnapshotTarget {
    fn capture(&self) -> Result<String, EditorError>;

    fn restore(&mut self, snapshot: &str) -> Result<(), EditorError>;
}

/// One undoable step
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    before: String,
    after: Option<String>,
    applied: bool,

    /// Optional description of this step
    pub description: Option<String>,
}

impl SnapshotEntry {
    /// Entry for an edit about to happen; `before` is the current document
    pub fn new(before: String) -> Self {
        Self {
            before,
            after: None,
            applied: false,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn is_applied(&self) -> bool {
        self.applied
    }

    /// Bytes held by both snapshots
    pub fn size(&self) -> usize {
        self.before.len() + self.after.as_ref().map_or(0, String::len)
    }

    /// First call records the current state as `after`; later calls restore it
    pub fn redo(&mut self, target: &mut dyn SnapshotTarget) -> Result<(), EditorError> {
        match &self.after {
            None => self.after = Some(target.capture()?),
            Some(after) => target.restore(after)?,
        }
        self.applied = true;
        Ok(())
    }

    pub fn undo(&mut self, target: &mut dyn SnapshotTarget) -> Result<(), EditorError> {
        target.restore(&self.before)?;
        self.applied = false;
        Ok(())
    }
}

/// Undo/redo stack of snapshot entries
#[derive(Debug)]
pub struct SnapshotUndoStack {
    /// Stack of applied entries (most recent last)
    undo_stack: Vec<SnapshotEntry>,

    /// Stack of undone entries (most recent last)
    redo_stack: Vec<SnapshotEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Entries larger than this are reported
    warn_bytes: usize,

    /// Set while batching; holds the merged entry once one was pushed
    current_batch: Option<Option<SnapshotEntry>>,

    batch_description: Option<String>,
}

impl SnapshotUndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            warn_bytes: usize::MAX,
            current_batch: None,
            batch_description: None,
        }
    }

    pub fn with_warn_bytes(mut self, warn_bytes: usize) -> Self {
        self.warn_bytes = warn_bytes;
        self
    }

    /// Apply the entry's first `redo` and record it
    pub fn push(&mut self, mut entry: SnapshotEntry, target: &mut dyn SnapshotTarget) -> Result<(), EditorError> {
        entry.redo(target)?;

        if let Some(batch) = &mut self.current_batch {
            match batch {
                Some(merged) => {
                    merged.after = entry.after;
                }
                None => *batch = Some(entry),
            }
            return Ok(());
        }

        self.record(entry);
        Ok(())
    }

    fn record(&mut self, entry: SnapshotEntry) {
        if entry.size() > self.warn_bytes {
            tracing::warn!(
                bytes = entry.size(),
                limit = self.warn_bytes,
                "undo snapshot exceeds configured size"
            );
        }

        self.undo_stack.push(entry);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Start a batch of entries (will be undone/redone together)
    pub fn begin_batch(&mut self) {
        if self.current_batch.is_none() {
            self.current_batch = Some(None);
            self.batch_description = None;
        }
    }

    /// End the current batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        if let Some(Some(mut entry)) = self.current_batch.take() {
            if let Some(description) = self.batch_description.take() {
                entry.description = Some(description);
            }
            self.record(entry);
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    /// Set description for current batch (if batching)
    pub fn set_batch_description(&mut self, description: impl Into<String>) {
        if self.current_batch.is_some() {
            self.batch_description = Some(description.into());
        }
    }

    /// Undo the most recent entry
    ///
    /// A failed restore keeps the entry on the undo stack.
    pub fn undo(&mut self, target: &mut dyn SnapshotTarget) -> Result<bool, EditorError> {
        self.end_batch();
        let Some(entry) = self.undo_stack.last_mut() else {
            return Ok(false); // Nothing to undo
        };
        entry.undo(target)?;

        if let Some(entry) = self.undo_stack.pop() {
            self.redo_stack.push(entry);
        }
        Ok(true)
    }

    /// Redo the most recently undone entry
    pub fn redo(&mut self, target: &mut dyn SnapshotTarget) -> Result<bool, EditorError> {
        let Some(entry) = self.redo_stack.last_mut() else {
            return Ok(false); // Nothing to redo
        };
        entry.redo(target)?;

        if let Some(entry) = self.redo_stack.pop() {
            self.undo_stack.push(entry);
        }
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
        self.batch_description = None;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for SnapshotUndoStack {
    fn default() -> Self {
        Self::new()
    }
}
