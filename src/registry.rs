//! Viewport registry: which viewports exist and their transient flags.
//!
//! The registry is the only component that talks to the engine about viewport
//! registration and the only one that changes tool-group membership.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ImageId;
use crate::constants::DEFAULT_ZOOM;
use crate::engine::{EnableStatus, RenderingEngine, RequestToken, ToolGroupHandle};
use crate::error::{Result, ViewerError};
use crate::layout::ViewportRole;

/// Globally unique viewport identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewportId(String);

impl ViewportId {
    /// Wrap a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewportId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Borrow<str> for ViewportId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Registry bookkeeping for one viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportRecord {
    /// Role in the current layout
    pub role: ViewportRole,
    /// Engine acknowledged registration
    pub enabled: bool,
    /// An asynchronous load is in flight
    pub loading: bool,
    /// Last reported zoom factor
    pub zoom: f32,
    /// Not yet populated by a drop or programmatic assignment
    pub is_fresh: bool,
    /// Color inversion currently applied
    pub inverted: bool,
    /// Latest load issued to this viewport, if still in flight
    pub latest_request: Option<RequestToken>,
}

impl ViewportRecord {
    fn new(role: ViewportRole, zoom: f32) -> Self {
        Self {
            role,
            enabled: true,
            loading: false,
            zoom,
            is_fresh: role == ViewportRole::Secondary,
            inverted: false,
            latest_request: None,
        }
    }
}

/// Read-only snapshot of a viewport, merging registry and stack state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportDescriptor {
    /// Viewport identifier
    pub id: ViewportId,
    /// Role in the current layout
    pub role: ViewportRole,
    /// Engine acknowledged registration
    pub enabled: bool,
    /// An asynchronous load is in flight
    pub loading: bool,
    /// Last reported zoom factor
    pub zoom: f32,
    /// Image currently presented
    pub displayed_reference: Option<ImageId>,
    /// Index of the presented image within the stack
    pub displayed_index: Option<usize>,
    /// Awaiting its first image
    pub is_fresh: bool,
    /// Color inversion currently applied
    pub inverted: bool,
}

/// How a load completion relates to the latest request of its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Completion belongs to the latest request
    Current,
    /// A newer request was issued since
    Stale,
    /// Viewport no longer exists
    Unknown,
}

/// Tracks enabled viewports and their transient flags.
#[derive(Debug, Clone, Default)]
pub struct ViewportRegistry {
    records: BTreeMap<ViewportId, ViewportRecord>,
}

impl ViewportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tools with the process tool group.
    pub fn register_tools<T: ToolGroupHandle>(&self, tools: &mut T, names: &[&str]) -> Result<()> {
        for name in names {
            tools.add_tool(name)?;
        }
        log::debug!("🧰 Registered {} tools", names.len());
        Ok(())
    }

    /// Enable a viewport. Idempotent.
    ///
    /// An engine reporting the element as already enabled counts as success.
    pub fn enable<E, T>(
        &mut self,
        engine: &mut E,
        tools: &mut T,
        id: &ViewportId,
        role: ViewportRole,
    ) -> Result<EnableStatus>
    where
        E: RenderingEngine,
        T: ToolGroupHandle,
    {
        if self.is_enabled(id) {
            log::debug!("Viewport {} already registered", id);
            return Ok(EnableStatus::AlreadyEnabled);
        }

        let status = engine.enable_viewport(id)?;
        if status == EnableStatus::AlreadyEnabled {
            log::debug!("Engine reports viewport {} may already be enabled", id);
        }
        tools.add_viewport(id)?;
        engine.subscribe_camera(id)?;

        let zoom = engine.zoom(id).unwrap_or(DEFAULT_ZOOM);
        self.records.insert(id.clone(), ViewportRecord::new(role, zoom));
        log::debug!("🖼️ Enabled {:?} viewport {}", role, id);
        Ok(status)
    }

    /// Release a viewport.
    ///
    /// Engine failures during teardown are logged, never propagated, so the
    /// entry is always released. Returns true if this was the last viewport.
    pub fn teardown<E, T>(&mut self, engine: &mut E, tools: &mut T, id: &ViewportId) -> Result<bool>
    where
        E: RenderingEngine,
        T: ToolGroupHandle,
    {
        if self.records.remove(id).is_none() {
            log::warn!("Teardown of unknown viewport {}", id);
            return Err(ViewerError::viewport_not_found(id));
        }

        if let Err(e) = tools.remove_viewport(id) {
            log::warn!("Failed to remove {} from tool group: {}", id, e);
        }
        if let Err(e) = engine.disable_viewport(id) {
            log::warn!("Failed to disable viewport {}: {}", id, e);
        }
        log::debug!("🗑️ Tore down viewport {}", id);
        Ok(self.records.is_empty())
    }

    /// Note a newly issued load; sets `loading`.
    pub fn begin_request(&mut self, id: &ViewportId, token: RequestToken) -> Result<()> {
        let record = self.record_mut(id)?;
        record.latest_request = Some(token);
        record.loading = true;
        Ok(())
    }

    /// Settle a load completion; clears `loading` only for the latest request.
    pub fn finish_request(&mut self, id: &ViewportId, token: RequestToken) -> RequestStatus {
        let Some(record) = self.records.get_mut(id) else {
            return RequestStatus::Unknown;
        };
        if record.latest_request != Some(token) {
            return RequestStatus::Stale;
        }
        record.latest_request = None;
        record.loading = false;
        RequestStatus::Current
    }

    /// Record a camera zoom. Unknown viewports are ignored.
    pub fn record_zoom(&mut self, id: &ViewportId, zoom: f32) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.zoom = zoom;
                true
            }
            None => false,
        }
    }

    /// Clear the fresh flag. Returns true the one time it flips.
    pub fn mark_populated(&mut self, id: &ViewportId) -> bool {
        match self.records.get_mut(id) {
            Some(record) if record.is_fresh => {
                record.is_fresh = false;
                log::debug!("Viewport {} populated", id);
                true
            }
            _ => false,
        }
    }

    /// Record the inversion state.
    pub fn set_inverted(&mut self, id: &ViewportId, inverted: bool) -> Result<()> {
        self.record_mut(id)?.inverted = inverted;
        Ok(())
    }

    /// Look up a record.
    pub fn get(&self, id: &ViewportId) -> Option<&ViewportRecord> {
        self.records.get(id)
    }

    /// Whether the viewport exists and is enabled.
    pub fn is_enabled(&self, id: &ViewportId) -> bool {
        self.records.get(id).is_some_and(|r| r.enabled)
    }

    /// Ids of all registered viewports.
    pub fn ids(&self) -> Vec<ViewportId> {
        self.records.keys().cloned().collect()
    }

    /// Iterate over registered viewports.
    pub fn iter(&self) -> impl Iterator<Item = (&ViewportId, &ViewportRecord)> {
        self.records.iter()
    }

    /// Number of registered viewports.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no viewport is registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record_mut(&mut self, id: &ViewportId) -> Result<&mut ViewportRecord> {
        self.records
            .get_mut(id)
            .ok_or_else(|| ViewerError::viewport_not_found(id))
    }
}
