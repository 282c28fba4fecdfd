//! Capability interfaces to the external rendering engine.
//!
//! The coordination engine never decodes pixels or moves cameras itself. It
//! issues commands through these traits and reacts to [`EngineEvent`]s that the
//! adapter reports back. Stack loads are asynchronous: `load_stack` only issues
//! the request, and completion arrives later as [`EngineEvent::StackLoaded`]
//! carrying the same [`RequestToken`].

use std::fmt;

use image::RgbaImage;
use thiserror::Error;

use crate::catalog::ImageId;
use crate::registry::ViewportId;

/// Token identifying one issued stack load.
///
/// Tokens come from a session-wide monotonic counter, so a token is never
/// reused even if a viewport id is torn down and created again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Wrap a raw sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// The raw sequence number.
    pub fn seq(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of asking the engine to enable a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableStatus {
    /// Viewport was registered by this call
    Enabled,
    /// Viewport was already registered
    AlreadyEnabled,
}

/// Input bindings a tool can be activated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBinding {
    /// Primary (left) pointer button
    Primary,
}

/// Errors reported by engine adapters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Engine was used before initialization
    #[error("engine not initialized")]
    NotInitialized,

    /// Engine has no viewport with this id
    #[error("unknown viewport '{0}'")]
    UnknownViewport(ViewportId),

    /// Tool name is not registered with the tool group
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// Image index outside the loaded stack
    #[error("image index {index} out of range for stack of {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Stack length
        len: usize,
    },

    /// Image could not be fetched or decoded
    #[error("failed to load image '{id}': {message}")]
    ImageLoad {
        /// Image that failed
        id: ImageId,
        /// Adapter-provided description
        message: String,
    },

    /// Viewport has nothing rendered to capture
    #[error("viewport '{0}' has no rendered frame")]
    NoFrame(ViewportId),

    /// Any other adapter failure
    #[error("{0}")]
    Backend(String),
}

/// Events an engine adapter reports back to the coordination engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A previously issued stack load finished
    StackLoaded {
        /// Viewport the load targeted
        viewport: ViewportId,
        /// Token passed to `load_stack`
        token: RequestToken,
        /// Outcome of the load
        result: Result<(), EngineError>,
    },
    /// Camera of a subscribed viewport changed
    CameraChanged {
        /// Viewport whose camera moved
        viewport: ViewportId,
        /// New zoom factor (1.0 = fit)
        zoom: f32,
    },
}

/// Narrow command surface of the external rendering engine.
pub trait RenderingEngine {
    /// Bring the engine up. Called once per session.
    fn initialize(&mut self) -> Result<(), EngineError>;

    /// Tear the engine down, releasing every viewport.
    fn destroy(&mut self);

    /// Register a viewport element with the engine.
    fn enable_viewport(&mut self, id: &ViewportId) -> Result<EnableStatus, EngineError>;

    /// Unregister a viewport element.
    fn disable_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Issue an asynchronous stack load.
    ///
    /// `initial_index` selects the image to present once loaded; `None` loads
    /// the stack without presenting anything.
    fn load_stack(
        &mut self,
        id: &ViewportId,
        stack: &[ImageId],
        initial_index: Option<usize>,
        token: RequestToken,
    ) -> Result<(), EngineError>;

    /// Present another image of the already loaded stack.
    fn set_image_index(&mut self, id: &ViewportId, index: usize) -> Result<(), EngineError>;

    /// Re-render a viewport.
    fn render(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Current zoom factor of a viewport.
    fn zoom(&self, id: &ViewportId) -> Option<f32>;

    /// Subscribe to camera-change events of a viewport.
    fn subscribe_camera(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Reset pan and zoom.
    fn reset_camera(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Reset display properties (inversion, windowing).
    fn reset_properties(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Set color inversion.
    fn set_inverted(&mut self, id: &ViewportId, inverted: bool) -> Result<(), EngineError>;

    /// Ids of the viewports the engine currently holds.
    fn viewports(&self) -> Vec<ViewportId>;

    /// Drain events produced since the last call.
    fn poll_events(&mut self) -> Vec<EngineEvent> {
        Vec::new()
    }
}

/// The process-wide tool group.
///
/// Membership is changed by the viewport registry only; the tool coordinator
/// only flips tools between active and passive.
pub trait ToolGroupHandle {
    /// Register a tool by engine name.
    fn add_tool(&mut self, tool_name: &str) -> Result<(), EngineError>;

    /// Let the group govern a viewport.
    fn add_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Stop governing a viewport.
    fn remove_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError>;

    /// Activate a tool on the given bindings.
    fn set_tool_active(&mut self, tool_name: &str, bindings: &[MouseBinding])
    -> Result<(), EngineError>;

    /// Deactivate a tool, releasing its bindings.
    fn set_tool_passive(&mut self, tool_name: &str) -> Result<(), EngineError>;
}

/// One annotation overlay captured for export.
#[derive(Debug, Clone)]
pub struct OverlayLayer {
    /// Stacking order, lower first
    pub z_index: i32,
    /// Rasterized overlay, any size
    pub image: RgbaImage,
}

impl OverlayLayer {
    /// Create a layer.
    pub fn new(z_index: i32, image: RgbaImage) -> Self {
        Self { z_index, image }
    }
}

/// Read access to rendered pixels, used by export.
pub trait FrameCapture {
    /// The frame currently rendered in a viewport.
    fn capture_frame(&self, id: &ViewportId) -> Result<RgbaImage, EngineError>;

    /// Annotation overlays drawn over a viewport.
    fn capture_overlays(&self, id: &ViewportId) -> Result<Vec<OverlayLayer>, EngineError>;
}
