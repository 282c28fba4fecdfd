//! Error types for coordination engine operations.

use thiserror::Error;

use crate::engine::EngineError;
use crate::export::ExportFailureReason;
use crate::registry::ViewportId;

/// Errors that can occur while coordinating viewports, tools and layouts.
///
/// Recoverable failures (load and export) are returned as values so the caller
/// can keep the session running and retry.
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Operation targeted an unknown or disabled viewport
    #[error("Viewport not found: {id}")]
    ViewportNotFound {
        /// The viewport id that was requested
        id: ViewportId,
    },

    /// Rendering engine has not been initialized (or was already shut down)
    #[error("Rendering engine unavailable")]
    EngineUnavailable,

    /// Asynchronous stack load was rejected by the engine
    #[error("Failed to load stack into viewport {viewport}: {reason}")]
    LoadFailure {
        /// Viewport the load was issued to
        viewport: ViewportId,
        /// Engine-provided description of the failure
        reason: String,
    },

    /// Capture or encode step of an export failed
    #[error("Export failed ({reason}): {detail}")]
    ExportFailed {
        /// Stable reason code
        reason: ExportFailureReason,
        /// Human-readable detail
        detail: String,
    },

    /// Engine command failed outside of a stack load
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Tool or action key not present in the tool catalog
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Key combination string could not be parsed
    #[error("Invalid key combination: {0}")]
    InvalidKeyCombo(String),

    /// Layout name could not be parsed
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),

    /// Configuration content is invalid
    #[error("Invalid config: {message}")]
    InvalidConfig {
        /// Description of the problem
        message: String,
    },

    /// Internal bookkeeping no longer holds
    #[error("Invariant violated: {message}")]
    InvariantViolation {
        /// Description of the violated invariant
        message: String,
    },

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ViewerError {
    /// Create a viewport-not-found error.
    pub fn viewport_not_found(id: &ViewportId) -> Self {
        Self::ViewportNotFound { id: id.clone() }
    }

    /// Create a load failure error.
    pub fn load_failure(viewport: &ViewportId, reason: impl Into<String>) -> Self {
        Self::LoadFailure {
            viewport: viewport.clone(),
            reason: reason.into(),
        }
    }

    /// Create an export failure error.
    pub fn export_failed(reason: ExportFailureReason, detail: impl Into<String>) -> Self {
        Self::ExportFailed {
            reason,
            detail: detail.into(),
        }
    }

    /// Create an invalid config error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Reason code if this is an export failure.
    pub fn export_reason(&self) -> Option<ExportFailureReason> {
        match self {
            Self::ExportFailed { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Result type for coordination engine operations.
pub type Result<T> = std::result::Result<T, ViewerError>;
