//! Configuration file support for SensVuer.
//!
//! Preferences and keybinding overrides are stored as JSON. Every field is
//! optional in the file; missing ones take their defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_EXPORT_PREFIX};
use crate::error::{Result, ViewerError};
use crate::history::HistoryGate;
use crate::keybindings::{KeyBindings, KeyCombo, ShortcutAction};
use crate::layout::LayoutMode;

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: ViewerPreferences,

    /// Keybinding overrides
    #[serde(default)]
    pub keybindings: KeyBindingsConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_app_name() -> String {
    "SensVuer".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerPreferences {
    /// Log verbosity level
    pub log_level: LogLevel,

    /// Layout applied at startup
    pub default_layout: LayoutMode,

    /// Prefix of generated export file names
    pub export_prefix: String,

    /// Composite annotations into exports by default
    pub include_annotations: bool,

    /// When undo/redo are forwarded to the history
    pub history_gate: HistoryGate,
}

impl Default for ViewerPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            default_layout: LayoutMode::default(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            include_annotations: true,
            history_gate: HistoryGate::default(),
        }
    }
}

/// Keybinding overrides, `combo -> action`, e.g. `"Ctrl+Shift+Z": "redo"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindingsConfig {
    /// Raw combo and action strings
    pub overrides: BTreeMap<String, String>,
}

impl From<&KeyBindings> for KeyBindingsConfig {
    fn from(bindings: &KeyBindings) -> Self {
        Self {
            overrides: bindings
                .iter()
                .map(|(combo, action)| (combo.to_string(), action.to_string()))
                .collect(),
        }
    }
}

impl KeyBindingsConfig {
    /// Default bindings with the overrides applied.
    pub fn to_keybindings(&self) -> Result<KeyBindings> {
        let mut bindings = KeyBindings::default();
        for (combo, action) in &self.overrides {
            let combo: KeyCombo = combo.parse()?;
            let action: ShortcutAction = action.parse()?;
            if let Some(previous) = bindings.key_conflict(combo, Some(action)) {
                log::info!("Key {} rebound from '{}' to '{}'", combo, previous, action);
            }
            bindings.bind(combo, action);
        }
        Ok(bindings)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: ViewerPreferences::default(),
            keybindings: KeyBindingsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ViewerError::invalid_config(format!(
                "file version {} is newer than supported version {}",
                config.version, CONFIG_VERSION
            )));
        }

        // Surface bad overrides at load time rather than on first key press
        config.keybindings.to_keybindings()?;
        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join(CONFIG_DIR_NAME)
                    .join(CONFIG_FILE_NAME)
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}
