//! Keyboard shortcuts for tools, commands and layouts.
//!
//! The default table mirrors the tool catalog shortcuts plus layout keys.
//! Bindings can be overridden from the config file.

use std::fmt;
use std::str::FromStr;

use crate::error::ViewerError;
use crate::layout::LayoutMode;
use crate::tools::{TOOL_CATALOG, ToolEntry};

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Control key
    pub ctrl: bool,
    /// Shift key
    pub shift: bool,
    /// Alt/Option key
    pub alt: bool,
    /// Meta/Command key
    pub meta: bool,
}

/// A key plus modifiers, e.g. `Ctrl+Z`.
///
/// Letters are stored uppercase so `z` and `Z` name the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    /// The pressed key
    pub key: char,
    /// Held modifiers
    pub modifiers: Modifiers,
}

impl KeyCombo {
    /// A bare key.
    pub fn new(key: char) -> Self {
        Self {
            key: key.to_ascii_uppercase(),
            modifiers: Modifiers::default(),
        }
    }

    /// A key with Ctrl held.
    pub fn ctrl(key: char) -> Self {
        Self {
            key: key.to_ascii_uppercase(),
            modifiers: Modifiers {
                ctrl: true,
                ..Modifiers::default()
            },
        }
    }

    /// A key with explicit modifiers.
    pub fn with_modifiers(key: char, modifiers: Modifiers) -> Self {
        Self {
            key: key.to_ascii_uppercase(),
            modifiers,
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("Alt+")?;
        }
        if self.modifiers.shift {
            f.write_str("Shift+")?;
        }
        if self.modifiers.meta {
            f.write_str("Meta+")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ViewerError::InvalidKeyCombo(s.to_string());
        let trimmed = s.trim();
        // The key is whatever follows the last '+'
        let (prefix, key) = match trimmed.rfind('+') {
            Some(pos) if pos + 1 < trimmed.len() => (&trimmed[..pos], &trimmed[pos + 1..]),
            Some(_) => return Err(invalid()),
            None => ("", trimmed),
        };

        let mut chars = key.chars();
        let (Some(key), None) = (chars.next(), chars.next()) else {
            return Err(invalid());
        };

        let mut modifiers = Modifiers::default();
        for part in prefix.split('+').filter(|p| !p.is_empty()) {
            match part.trim().to_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" => modifiers.meta = true,
                _ => return Err(invalid()),
            }
        }
        Ok(KeyCombo::with_modifiers(key, modifiers))
    }
}

/// What a shortcut triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutAction {
    /// A tool or command from the catalog
    Tool(ToolEntry),
    /// Switch to a layout
    Layout(LayoutMode),
}

impl fmt::Display for ShortcutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutAction::Tool(entry) => write!(f, "{}", entry),
            ShortcutAction::Layout(mode) => write!(f, "layout:{}", mode),
        }
    }
}

impl FromStr for ShortcutAction {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().strip_prefix("layout:") {
            Some(mode) => Ok(ShortcutAction::Layout(mode.parse()?)),
            None => Ok(ShortcutAction::Tool(s.parse()?)),
        }
    }
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// Viewer surface or any non-editable element
    #[default]
    Viewer,
    /// Text input or other editable element
    Editable,
}

/// Shortcut table.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: Vec<(KeyCombo, ShortcutAction)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings: Vec<(KeyCombo, ShortcutAction)> = TOOL_CATALOG
            .iter()
            .filter_map(|descriptor| {
                let combo = descriptor.shortcut.parse::<KeyCombo>().ok()?;
                Some((combo, ShortcutAction::Tool(descriptor.entry)))
            })
            .collect();

        // Default layout hotkeys: 1 single, 2 dual, 4 quad
        bindings.push((KeyCombo::new('1'), ShortcutAction::Layout(LayoutMode::Single)));
        bindings.push((KeyCombo::new('2'), ShortcutAction::Layout(LayoutMode::Dual)));
        bindings.push((KeyCombo::new('4'), ShortcutAction::Layout(LayoutMode::Quad)));

        Self { bindings }
    }
}

impl KeyBindings {
    /// Create keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty table.
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Get the action bound to a combo, if any.
    pub fn action_for(&self, combo: KeyCombo) -> Option<ShortcutAction> {
        self.bindings
            .iter()
            .find(|(bound, _)| *bound == combo)
            .map(|(_, action)| *action)
    }

    /// Bind `combo` to `action`.
    ///
    /// The action loses its previous combo and any other action that used
    /// `combo` loses it.
    pub fn bind(&mut self, combo: KeyCombo, action: ShortcutAction) {
        self.bindings
            .retain(|(bound_combo, bound_action)| *bound_combo != combo && *bound_action != action);
        self.bindings.push((combo, action));
    }

    /// Check if a combo is already used by another action.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, combo: KeyCombo, exclude: Option<ShortcutAction>) -> Option<String> {
        self.bindings
            .iter()
            .find(|(bound, action)| *bound == combo && Some(*action) != exclude)
            .map(|(_, action)| action.to_string())
    }

    /// Resolve a key press.
    ///
    /// Returns `None` while an editable element has focus and for unbound combos.
    pub fn dispatch(&self, combo: KeyCombo, focus: Focus) -> Option<ShortcutAction> {
        if focus == Focus::Editable {
            return None;
        }
        let action = self.action_for(combo);
        if action.is_none() {
            log::trace!("Unbound key {}", combo);
        }
        action
    }

    /// Iterate over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = &(KeyCombo, ShortcutAction)> {
        self.bindings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolCommand, ToolKey};

    #[test]
    fn test_parse_combos() {
        assert_eq!("V".parse::<KeyCombo>().unwrap(), KeyCombo::new('v'));
        assert_eq!("Ctrl+Z".parse::<KeyCombo>().unwrap(), KeyCombo::ctrl('z'));
        assert_eq!("ctrl+,".parse::<KeyCombo>().unwrap(), KeyCombo::ctrl(','));
        let combo: KeyCombo = "Ctrl+Shift+S".parse().unwrap();
        assert!(combo.modifiers.ctrl && combo.modifiers.shift);
        assert!("Ctrl+".parse::<KeyCombo>().is_err());
        assert!("Hyper+Q".parse::<KeyCombo>().is_err());
        assert!("Ctrl+AB".parse::<KeyCombo>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let combo: KeyCombo = "Ctrl+Y".parse().unwrap();
        assert_eq!(combo.to_string(), "Ctrl+Y");
        assert_eq!(combo.to_string().parse::<KeyCombo>().unwrap(), combo);
    }

    #[test]
    fn test_default_table() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.action_for(KeyCombo::new('v')),
            Some(ShortcutAction::Tool(ToolEntry::Tool(ToolKey::Move)))
        );
        assert_eq!(
            bindings.action_for(KeyCombo::ctrl('z')),
            Some(ShortcutAction::Tool(ToolEntry::Command(ToolCommand::Undo)))
        );
        assert_eq!(
            bindings.action_for(KeyCombo::new('2')),
            Some(ShortcutAction::Layout(LayoutMode::Dual))
        );
        // Bare Z is the zoom tool, Ctrl+Z is undo
        assert_ne!(
            bindings.action_for(KeyCombo::new('z')),
            bindings.action_for(KeyCombo::ctrl('z'))
        );
    }

    #[test]
    fn test_dispatch_suppressed_in_editable() {
        let bindings = KeyBindings::default();
        assert!(bindings.dispatch(KeyCombo::new('l'), Focus::Editable).is_none());
        assert!(bindings.dispatch(KeyCombo::new('l'), Focus::Viewer).is_some());
        assert!(bindings.dispatch(KeyCombo::new('q'), Focus::Viewer).is_none());
    }

    #[test]
    fn test_rebind_moves_combo() {
        let mut bindings = KeyBindings::default();
        let arrow = ShortcutAction::Tool(ToolEntry::Tool(ToolKey::Arrow));

        bindings.bind(KeyCombo::new('v'), arrow);

        assert_eq!(bindings.action_for(KeyCombo::new('v')), Some(arrow));
        assert_eq!(bindings.action_for(KeyCombo::new('a')), None);
        let move_tool = ShortcutAction::Tool(ToolEntry::Tool(ToolKey::Move));
        assert!(bindings.iter().all(|(_, action)| *action != move_tool));
    }

    #[test]
    fn test_key_conflict() {
        let bindings = KeyBindings::default();
        let undo = ShortcutAction::Tool(ToolEntry::Command(ToolCommand::Undo));
        assert_eq!(
            bindings.key_conflict(KeyCombo::ctrl('z'), None),
            Some("undo".to_string())
        );
        assert_eq!(bindings.key_conflict(KeyCombo::ctrl('z'), Some(undo)), None);
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            "layout:quad".parse::<ShortcutAction>().unwrap(),
            ShortcutAction::Layout(LayoutMode::Quad)
        );
        assert_eq!(
            "eraser".parse::<ShortcutAction>().unwrap(),
            ShortcutAction::Tool(ToolEntry::Tool(ToolKey::Eraser))
        );
        assert!("layout:hex".parse::<ShortcutAction>().is_err());
    }
}
