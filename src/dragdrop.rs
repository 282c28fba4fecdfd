//! Drag-and-drop routing of images onto specific viewports.

use std::collections::HashMap;

use crate::catalog::ImageId;
use crate::constants::DRAG_IMAGE_KEY;
use crate::error::{Result, ViewerError};
use crate::registry::{ViewportId, ViewportRegistry};

/// String key/value data carried by a drag operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DropPayload {
    data: HashMap<String, String>,
}

impl DropPayload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload carrying an image reference under the standard key.
    pub fn for_image(id: &ImageId) -> Self {
        Self::new().with(DRAG_IMAGE_KEY, id.as_str())
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Store a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// The dragged image, if the payload carries a non-empty one.
    pub fn image_id(&self) -> Option<ImageId> {
        self.get(DRAG_IMAGE_KEY)
            .filter(|value| !value.is_empty())
            .map(ImageId::from)
    }
}

/// A validated drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropRequest {
    /// Dragged image
    pub source: ImageId,
    /// Viewport it was dropped on
    pub destination: ViewportId,
}

/// Resolve a drop against the registry.
///
/// A payload without an image is a silent no-op (`Ok(None)`); an unknown or
/// disabled destination is reported as `ViewportNotFound`.
pub fn resolve_drop(
    payload: &DropPayload,
    destination: &ViewportId,
    registry: &ViewportRegistry,
) -> Result<Option<DropRequest>> {
    let Some(source) = payload.image_id() else {
        log::debug!("Drop on {} without image payload ignored", destination);
        return Ok(None);
    };

    if !registry.is_enabled(destination) {
        log::warn!("Drop of {} on unknown viewport {}", source, destination);
        return Err(ViewerError::viewport_not_found(destination));
    }

    Ok(Some(DropRequest {
        source,
        destination: destination.clone(),
    }))
}
