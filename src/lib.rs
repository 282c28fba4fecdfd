//! SensVuer - Multi-viewport image viewer coordination engine
//!
//! Keeps a set of viewports, their image stacks, a single active interaction
//! tool and the comparison layout consistent while the external rendering
//! engine loads images asynchronously. The engine, tool group and undo
//! history are reached through narrow traits; [`headless`] provides in-memory
//! implementations of all three.
//!
//! ```no_run
//! use sensvuer::headless::{HeadlessEngine, HeadlessToolGroup, UndoStack};
//! use sensvuer::{ImageReference, LayoutMode, Workspace};
//!
//! # fn main() -> sensvuer::Result<()> {
//! let mut workspace = Workspace::new(
//!     HeadlessEngine::new(),
//!     HeadlessToolGroup::new(),
//!     UndoStack::new(),
//! );
//! let mut session = workspace.session()?;
//! session.import_images(vec![ImageReference::from_path("scan.png".as_ref())])?;
//! session.pump()?;
//! session.set_layout(LayoutMode::Dual)?;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod constants;
pub mod dragdrop;
pub mod engine;
pub mod error;
pub mod export;
pub mod headless;
pub mod history;
pub mod keybindings;
pub mod layout;
pub mod registry;
pub mod stack;
pub mod tools;
pub mod workspace;

pub use catalog::{ImageCatalog, ImageId, ImageReference};
pub use config::ViewerConfig;
pub use engine::{
    EngineError, EngineEvent, FrameCapture, RenderingEngine, RequestToken, ToolGroupHandle,
};
pub use error::{Result, ViewerError};
pub use export::{ExportArtifact, ExportFailureReason, ExportRequest};
pub use history::{HistoryGate, HistoryStack};
pub use keybindings::{Focus, KeyBindings, KeyCombo};
pub use layout::{LayoutMode, LayoutTransition, ViewportRole};
pub use registry::{ViewportDescriptor, ViewportId};
pub use tools::{ToolCommand, ToolEntry, ToolKey};
pub use workspace::{
    CommandOutcome, DropOutcome, EventOutcome, KeyOutcome, LoadCompletion, Session, StackUpdate,
    Workspace,
};
