//! Headless reference adapters for the engine collaborators.
//!
//! Used by the command line binary and by tests. Nothing is drawn on screen;
//! frames are kept as in-memory RGBA buffers.

mod engine;
mod history;
mod tool_group;

pub use engine::{CompletionMode, HeadlessEngine};
pub use history::{HistoryEntry, UndoConfig, UndoStack};
pub use tool_group::HeadlessToolGroup;
