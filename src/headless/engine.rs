//! In-memory rendering engine.

use std::collections::{BTreeMap, HashMap, VecDeque};

use image::{Rgba, RgbaImage};

use crate::catalog::ImageId;
use crate::constants::DEFAULT_ZOOM;
use crate::engine::{
    EnableStatus, EngineError, EngineEvent, FrameCapture, OverlayLayer, RenderingEngine,
    RequestToken,
};
use crate::registry::ViewportId;

/// When issued stack loads complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Every pending load completes on the next `poll_events`
    #[default]
    OnPoll,
    /// Loads complete only through [`HeadlessEngine::resolve`]
    Manual,
}

/// A load that has been issued but not completed.
#[derive(Debug, Clone)]
struct IssuedLoad {
    viewport: ViewportId,
    stack: Vec<ImageId>,
    index: Option<usize>,
    token: RequestToken,
}

#[derive(Debug, Clone)]
struct HeadlessViewport {
    stack: Vec<ImageId>,
    index: Option<usize>,
    source: Option<RgbaImage>,
    frame: Option<RgbaImage>,
    overlays: Vec<OverlayLayer>,
    zoom: f32,
    subscribed: bool,
    inverted: bool,
    latest_load: Option<RequestToken>,
}

impl HeadlessViewport {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            index: None,
            source: None,
            frame: None,
            overlays: Vec::new(),
            zoom: DEFAULT_ZOOM,
            subscribed: false,
            inverted: false,
            latest_load: None,
        }
    }

    fn redraw(&mut self) {
        self.frame = self.source.as_ref().map(|source| {
            let mut frame = source.clone();
            if self.inverted {
                image::imageops::invert(&mut frame);
            }
            frame
        });
    }
}

/// Rendering engine that keeps decoded images in memory.
///
/// Pixels come from images registered with [`insert_image`](Self::insert_image)
/// or from `file:` identifiers decoded with the `image` crate. Remote `web:`
/// identifiers cannot be fetched and fail to load. Every command is recorded
/// in a call log for inspection.
#[derive(Debug, Default)]
pub struct HeadlessEngine {
    initialized: bool,
    mode: CompletionMode,
    images: HashMap<ImageId, RgbaImage>,
    viewports: BTreeMap<ViewportId, HeadlessViewport>,
    issued: VecDeque<IssuedLoad>,
    events: VecDeque<EngineEvent>,
    calls: Vec<String>,
}

impl HeadlessEngine {
    /// Create an engine whose loads complete on the next poll.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine whose loads complete only when resolved.
    pub fn manual() -> Self {
        Self {
            mode: CompletionMode::Manual,
            ..Self::default()
        }
    }

    /// The completion mode.
    pub fn completion_mode(&self) -> CompletionMode {
        self.mode
    }

    /// Whether `initialize` has run and `destroy` has not.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register pixel data for an image id.
    pub fn insert_image(&mut self, id: impl Into<ImageId>, image: RgbaImage) {
        self.images.insert(id.into(), image);
    }

    /// Register a single-color image.
    pub fn insert_solid(
        &mut self,
        id: impl Into<ImageId>,
        width: u32,
        height: u32,
        color: [u8; 4],
    ) {
        self.insert_image(id, RgbaImage::from_pixel(width, height, Rgba(color)));
    }

    /// Draw an annotation overlay on a viewport.
    pub fn add_overlay(&mut self, id: &ViewportId, layer: OverlayLayer) -> Result<(), EngineError> {
        self.viewport_mut(id)?.overlays.push(layer);
        Ok(())
    }

    /// Simulate a user zoom. Subscribers get a camera event.
    pub fn set_zoom(&mut self, id: &ViewportId, zoom: f32) -> Result<(), EngineError> {
        let viewport = self.viewport_mut(id)?;
        viewport.zoom = zoom;
        if viewport.subscribed {
            self.events.push_back(EngineEvent::CameraChanged {
                viewport: id.clone(),
                zoom,
            });
        }
        Ok(())
    }

    /// Tokens of loads not yet completed, in issue order.
    pub fn pending_tokens(&self) -> Vec<RequestToken> {
        self.issued.iter().map(|load| load.token).collect()
    }

    /// Complete one issued load and return its event.
    ///
    /// The engine applies the load only if it is the latest one for its
    /// viewport; an older load still reports completion.
    pub fn resolve(&mut self, token: RequestToken) -> Option<EngineEvent> {
        let position = self.issued.iter().position(|load| load.token == token)?;
        let load = self.issued.remove(position)?;
        Some(self.finish(load))
    }

    /// Complete every issued load, oldest first.
    pub fn resolve_all(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(self.issued.len());
        while let Some(load) = self.issued.pop_front() {
            events.push(self.finish(load));
        }
        events
    }

    /// Stack loaded into a viewport.
    pub fn stack(&self, id: &ViewportId) -> Option<&[ImageId]> {
        self.viewports.get(id).map(|v| v.stack.as_slice())
    }

    /// Index presented by a viewport.
    pub fn image_index(&self, id: &ViewportId) -> Option<usize> {
        self.viewports.get(id).and_then(|v| v.index)
    }

    /// Whether inversion is applied to a viewport.
    pub fn is_inverted(&self, id: &ViewportId) -> bool {
        self.viewports.get(id).is_some_and(|v| v.inverted)
    }

    /// Recorded commands, e.g. `load:primary_viewport`.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Forget recorded commands.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn finish(&mut self, load: IssuedLoad) -> EngineEvent {
        let result = self.apply(&load);
        match &result {
            Ok(()) => log::debug!("Load {} into {} finished", load.token, load.viewport),
            Err(e) => log::warn!("Load {} into {} failed: {}", load.token, load.viewport, e),
        }
        EngineEvent::StackLoaded {
            viewport: load.viewport,
            token: load.token,
            result,
        }
    }

    fn apply(&mut self, load: &IssuedLoad) -> Result<(), EngineError> {
        let source = match load.index {
            Some(index) => {
                let id = load.stack.get(index).ok_or(EngineError::IndexOutOfRange {
                    index,
                    len: load.stack.len(),
                })?;
                Some(self.fetch(id)?)
            }
            None => None,
        };

        let viewport = self
            .viewports
            .get_mut(&load.viewport)
            .ok_or_else(|| EngineError::UnknownViewport(load.viewport.clone()))?;
        if viewport.latest_load != Some(load.token) {
            // Superseded inside the engine as well
            return Ok(());
        }
        viewport.stack = load.stack.clone();
        viewport.index = load.index;
        viewport.source = source;
        viewport.redraw();
        Ok(())
    }

    fn fetch(&self, id: &ImageId) -> Result<RgbaImage, EngineError> {
        if let Some(image) = self.images.get(id) {
            return Ok(image.clone());
        }
        let Some(path) = id.local_path() else {
            return Err(EngineError::ImageLoad {
                id: id.clone(),
                message: "no pixel data available".to_string(),
            });
        };
        match image::open(&path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                log::info!("🖼️ Loaded {}x{} image {:?}", rgba.width(), rgba.height(), path);
                Ok(rgba)
            }
            Err(e) => Err(EngineError::ImageLoad {
                id: id.clone(),
                message: e.to_string(),
            }),
        }
    }

    fn ensure_initialized(&self) -> Result<(), EngineError> {
        if self.initialized {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    fn viewport(&self, id: &ViewportId) -> Result<&HeadlessViewport, EngineError> {
        self.viewports
            .get(id)
            .ok_or_else(|| EngineError::UnknownViewport(id.clone()))
    }

    fn viewport_mut(&mut self, id: &ViewportId) -> Result<&mut HeadlessViewport, EngineError> {
        self.viewports
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownViewport(id.clone()))
    }
}

impl RenderingEngine for HeadlessEngine {
    fn initialize(&mut self) -> Result<(), EngineError> {
        self.initialized = true;
        self.calls.push("initialize".to_string());
        Ok(())
    }

    fn destroy(&mut self) {
        self.initialized = false;
        self.viewports.clear();
        self.issued.clear();
        self.events.clear();
        self.calls.push("destroy".to_string());
    }

    fn enable_viewport(&mut self, id: &ViewportId) -> Result<EnableStatus, EngineError> {
        self.ensure_initialized()?;
        self.calls.push(format!("enable:{}", id));
        if self.viewports.contains_key(id) {
            return Ok(EnableStatus::AlreadyEnabled);
        }
        self.viewports.insert(id.clone(), HeadlessViewport::new());
        Ok(EnableStatus::Enabled)
    }

    fn disable_viewport(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.calls.push(format!("disable:{}", id));
        self.viewports
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownViewport(id.clone()))
    }

    fn load_stack(
        &mut self,
        id: &ViewportId,
        stack: &[ImageId],
        initial_index: Option<usize>,
        token: RequestToken,
    ) -> Result<(), EngineError> {
        self.ensure_initialized()?;
        self.viewport_mut(id)?.latest_load = Some(token);
        self.calls.push(format!("load:{}", id));
        self.issued.push_back(IssuedLoad {
            viewport: id.clone(),
            stack: stack.to_vec(),
            index: initial_index,
            token,
        });
        Ok(())
    }

    fn set_image_index(&mut self, id: &ViewportId, index: usize) -> Result<(), EngineError> {
        let target = {
            let viewport = self.viewport(id)?;
            viewport
                .stack
                .get(index)
                .cloned()
                .ok_or(EngineError::IndexOutOfRange {
                    index,
                    len: viewport.stack.len(),
                })?
        };
        let source = self.fetch(&target)?;
        self.calls.push(format!("index:{}:{}", id, index));

        let viewport = self.viewport_mut(id)?;
        viewport.index = Some(index);
        viewport.source = Some(source);
        viewport.redraw();
        Ok(())
    }

    fn render(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.viewport_mut(id)?.redraw();
        self.calls.push(format!("render:{}", id));
        Ok(())
    }

    fn zoom(&self, id: &ViewportId) -> Option<f32> {
        self.viewports.get(id).map(|v| v.zoom)
    }

    fn subscribe_camera(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.viewport_mut(id)?.subscribed = true;
        Ok(())
    }

    fn reset_camera(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.calls.push(format!("reset_camera:{}", id));
        self.set_zoom(id, DEFAULT_ZOOM)
    }

    fn reset_properties(&mut self, id: &ViewportId) -> Result<(), EngineError> {
        self.calls.push(format!("reset_properties:{}", id));
        let viewport = self.viewport_mut(id)?;
        viewport.inverted = false;
        viewport.redraw();
        Ok(())
    }

    fn set_inverted(&mut self, id: &ViewportId, inverted: bool) -> Result<(), EngineError> {
        self.calls.push(format!("invert:{}:{}", id, inverted));
        let viewport = self.viewport_mut(id)?;
        viewport.inverted = inverted;
        viewport.redraw();
        Ok(())
    }

    fn viewports(&self) -> Vec<ViewportId> {
        self.viewports.keys().cloned().collect()
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        if self.mode == CompletionMode::OnPoll {
            let completed = self.resolve_all();
            self.events.extend(completed);
        }
        self.events.drain(..).collect()
    }
}

impl FrameCapture for HeadlessEngine {
    fn capture_frame(&self, id: &ViewportId) -> Result<RgbaImage, EngineError> {
        self.viewport(id)?
            .frame
            .clone()
            .ok_or_else(|| EngineError::NoFrame(id.clone()))
    }

    fn capture_overlays(&self, id: &ViewportId) -> Result<Vec<OverlayLayer>, EngineError> {
        Ok(self.viewport(id)?.overlays.clone())
    }
}
