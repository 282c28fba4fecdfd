//! Tool catalog and the single-active-tool coordinator.
//!
//! Navigation and annotation tools are mutually exclusive states: at most one
//! is bound to the pointer at any time, engine-wide. View-mode and action
//! entries are fire-once commands and never touch the active tool.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{MouseBinding, ToolGroupHandle};
use crate::error::{Result, ViewerError};

/// Category of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolCategory {
    /// Camera manipulation (exclusive)
    Navigation,
    /// Measurement and markup (exclusive)
    Annotation,
    /// Display toggles (fire-once)
    ViewMode,
    /// One-shot commands (fire-once)
    Action,
}

impl ToolCategory {
    /// Whether entries of this category take part in mutual exclusion.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, ToolCategory::Navigation | ToolCategory::Annotation)
    }
}

/// Exclusive interaction tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKey {
    /// Pan the camera
    Move,
    /// Drag to zoom
    Zoom,
    /// Distance measurement
    Length,
    /// Rectangular region of interest
    RectangleRoi,
    /// Elliptical region of interest
    EllipseRoi,
    /// Arrow annotation
    Arrow,
    /// Remove annotations
    Eraser,
}

impl ToolKey {
    /// Catalog key.
    pub fn key(&self) -> &'static str {
        match self {
            ToolKey::Move => "move",
            ToolKey::Zoom => "zoom",
            ToolKey::Length => "length",
            ToolKey::RectangleRoi => "rectangle-roi",
            ToolKey::EllipseRoi => "ellipse-roi",
            ToolKey::Arrow => "arrow",
            ToolKey::Eraser => "eraser",
        }
    }

    /// Name the rendering engine registers this tool under.
    pub fn engine_name(&self) -> &'static str {
        match self {
            ToolKey::Move => "Pan",
            ToolKey::Zoom => "Zoom",
            ToolKey::Length => "Length",
            ToolKey::RectangleRoi => "RectangleROI",
            ToolKey::EllipseRoi => "EllipticalROI",
            ToolKey::Arrow => "ArrowAnnotate",
            ToolKey::Eraser => "Eraser",
        }
    }

    /// Category of this tool.
    pub fn category(&self) -> ToolCategory {
        match self {
            ToolKey::Move | ToolKey::Zoom => ToolCategory::Navigation,
            _ => ToolCategory::Annotation,
        }
    }

    /// Get all exclusive tools.
    pub fn all() -> &'static [ToolKey] {
        &[
            ToolKey::Move,
            ToolKey::Zoom,
            ToolKey::Length,
            ToolKey::RectangleRoi,
            ToolKey::EllipseRoi,
            ToolKey::Arrow,
            ToolKey::Eraser,
        ]
    }

    /// Engine names of every exclusive tool, for tool-group registration.
    pub fn engine_names() -> Vec<&'static str> {
        Self::all().iter().map(ToolKey::engine_name).collect()
    }
}

/// Fire-once view-mode and action commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolCommand {
    /// Toggle color inversion
    Invert,
    /// Reset camera and display properties
    Reset,
    /// Undo the last history entry
    Undo,
    /// Redo the last undone entry
    Redo,
    /// Open the export dialog
    Export,
    /// Open the settings dialog
    Settings,
}

impl ToolCommand {
    /// Catalog key.
    pub fn key(&self) -> &'static str {
        match self {
            ToolCommand::Invert => "invert",
            ToolCommand::Reset => "reset",
            ToolCommand::Undo => "undo",
            ToolCommand::Redo => "redo",
            ToolCommand::Export => "export",
            ToolCommand::Settings => "settings",
        }
    }

    /// Category of this command.
    pub fn category(&self) -> ToolCategory {
        match self {
            ToolCommand::Invert => ToolCategory::ViewMode,
            _ => ToolCategory::Action,
        }
    }

    /// Get all commands.
    pub fn all() -> &'static [ToolCommand] {
        &[
            ToolCommand::Invert,
            ToolCommand::Reset,
            ToolCommand::Undo,
            ToolCommand::Redo,
            ToolCommand::Export,
            ToolCommand::Settings,
        ]
    }
}

/// Any tool catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolEntry {
    /// Exclusive tool
    Tool(ToolKey),
    /// Fire-once command
    Command(ToolCommand),
}

impl ToolEntry {
    /// Catalog key.
    pub fn key(&self) -> &'static str {
        match self {
            ToolEntry::Tool(tool) => tool.key(),
            ToolEntry::Command(command) => command.key(),
        }
    }

    /// Category of this entry.
    pub fn category(&self) -> ToolCategory {
        match self {
            ToolEntry::Tool(tool) => tool.category(),
            ToolEntry::Command(command) => command.category(),
        }
    }
}

impl fmt::Display for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ToolEntry {
    type Err = ViewerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim();
        if let Some(tool) = ToolKey::all().iter().find(|t| t.key() == key) {
            return Ok(ToolEntry::Tool(*tool));
        }
        if let Some(command) = ToolCommand::all().iter().find(|c| c.key() == key) {
            return Ok(ToolEntry::Command(*command));
        }
        Err(ViewerError::UnknownTool(key.to_string()))
    }
}

/// Static description of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// The entry
    pub entry: ToolEntry,
    /// Default keyboard shortcut
    pub shortcut: &'static str,
    /// Tooltip text
    pub label: &'static str,
}

impl ToolDescriptor {
    /// Catalog key.
    pub fn key(&self) -> &'static str {
        self.entry.key()
    }

    /// Category of the entry.
    pub fn category(&self) -> ToolCategory {
        self.entry.category()
    }
}

/// The fixed tool catalog, in toolbar order.
pub const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::Move),
        shortcut: "V",
        label: "Move",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::Zoom),
        shortcut: "Z",
        label: "Zoom",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::Length),
        shortcut: "L",
        label: "Length",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::RectangleRoi),
        shortcut: "R",
        label: "Rectangle ROI",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::EllipseRoi),
        shortcut: "E",
        label: "Ellipse ROI",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::Arrow),
        shortcut: "A",
        label: "Arrow",
    },
    ToolDescriptor {
        entry: ToolEntry::Tool(ToolKey::Eraser),
        shortcut: "X",
        label: "Eraser",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Invert),
        shortcut: "I",
        label: "Invert colors",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Reset),
        shortcut: "0",
        label: "Reset view",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Undo),
        shortcut: "Ctrl+Z",
        label: "Undo",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Redo),
        shortcut: "Ctrl+Y",
        label: "Redo",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Export),
        shortcut: "Ctrl+S",
        label: "Export image",
    },
    ToolDescriptor {
        entry: ToolEntry::Command(ToolCommand::Settings),
        shortcut: "Ctrl+,",
        label: "Settings",
    },
];

/// Result of a tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolTransition {
    /// Tool is now the single active tool
    Activated(ToolKey),
    /// Tool was active and is now off; nothing is active
    Deactivated(ToolKey),
    /// No image is displayed, so selection was ignored
    Disabled,
}

/// Owns the active-tool state.
#[derive(Debug, Clone, Default)]
pub struct ToolCoordinator {
    active: Option<ToolKey>,
}

impl ToolCoordinator {
    /// Create a coordinator with no active tool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active tool, if any.
    pub fn active_tool(&self) -> Option<ToolKey> {
        self.active
    }

    /// Select a tool, toggling it off when it is already active.
    ///
    /// Every exclusive tool is made passive before the new one is bound, so two
    /// tools are never bound to the same input at once.
    pub fn select<T: ToolGroupHandle>(
        &mut self,
        tools: &mut T,
        key: ToolKey,
        enabled: bool,
    ) -> Result<ToolTransition> {
        if !enabled {
            log::debug!("Tool '{}' ignored, nothing displayed", key.key());
            return Ok(ToolTransition::Disabled);
        }

        if self.active == Some(key) {
            self.deactivate_all(tools)?;
            log::debug!("🔧 Tool '{}' toggled off", key.key());
            return Ok(ToolTransition::Deactivated(key));
        }

        self.deactivate_all(tools)?;
        tools.set_tool_active(key.engine_name(), &[MouseBinding::Primary])?;
        self.active = Some(key);
        log::debug!("🔧 Tool '{}' active", key.key());
        Ok(ToolTransition::Activated(key))
    }

    /// Make every exclusive tool passive and forget the active one.
    pub fn deactivate_all<T: ToolGroupHandle>(&mut self, tools: &mut T) -> Result<()> {
        self.active = None;
        for tool in ToolKey::all() {
            tools.set_tool_passive(tool.engine_name())?;
        }
        Ok(())
    }
}
