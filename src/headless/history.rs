//! Bounded undo/redo history.
//!
//! Maintains two stacks:
//! - `undo_stack`: entries that can be undone (most recent at the end)
//! - `redo_stack`: entries that can be redone (most recent at the end)
//!
//! Pushing a new entry clears the redo stack. Undo moves the top entry to the
//! redo stack and redo moves it back.

use crate::constants::DEFAULT_MAX_HISTORY;
use crate::history::HistoryStack;

/// One recorded edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Human-readable description, e.g. "Add length measurement"
    pub description: String,
}

impl HistoryEntry {
    /// Create an entry.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Configuration for the undo stack
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of entries to keep in history
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// The undo/redo history stack.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    config: UndoConfig,
}

impl UndoStack {
    /// Create a new empty undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Record an edit. This clears the redo stack.
    pub fn push(&mut self, entry: HistoryEntry) {
        log::debug!("📝 Undo: pushed '{}'", entry.description);
        self.undo_stack.push(entry);
        self.redo_stack.clear();

        while self.undo_stack.len() > self.config.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Move the most recent entry to the redo stack and return it.
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        log::debug!("⏪ Undo: '{}'", entry.description);
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Move the most recently undone entry back and return it.
    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        log::debug!("⏩ Redo: '{}'", entry.description);
        self.undo_stack.push(entry.clone());
        Some(entry)
    }

    /// Description of the entry that would be undone
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.description.as_str())
    }

    /// Description of the entry that would be redone
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.description.as_str())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("🗑️ Undo history cleared");
    }

    /// Number of entries in undo history
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of entries in redo history
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

impl HistoryStack for UndoStack {
    fn undo(&mut self) {
        if self.pop_undo().is_none() {
            log::trace!("Nothing to undo");
        }
    }

    fn redo(&mut self) {
        if self.pop_redo().is_none() {
            log::trace!("Nothing to redo");
        }
    }
}
