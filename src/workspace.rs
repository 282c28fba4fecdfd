//! The coordination engine.
//!
//! A [`Workspace`] owns the image catalog, the viewport registry, stack
//! assignment, tool state, the layout and the history bridge. Every user
//! intent arrives as a method call and every engine report arrives through
//! [`Workspace::handle_event`]; nothing is global.
//!
//! Stack loads are asynchronous. Issuing one sets `loading` on the viewport
//! and returns a [`RequestToken`]; the engine later reports completion with
//! the same token. Only the latest token of a viewport is honored.

use std::ops::{Deref, DerefMut};

use crate::catalog::{ImageCatalog, ImageId, ImageReference, demo_references};
use crate::config::ViewerConfig;
use crate::constants::{DEFAULT_EXPORT_PREFIX, PRIMARY_VIEWPORT_ID};
use crate::dragdrop::{DropPayload, resolve_drop};
use crate::engine::{
    EngineError, EngineEvent, FrameCapture, RenderingEngine, RequestToken, ToolGroupHandle,
};
use crate::error::{Result, ViewerError};
use crate::export::{
    ExportArtifact, ExportCompositor, ExportFailureReason, ExportRequest, default_file_name,
};
use crate::history::{HistoryBridge, HistoryGate, HistoryOutcome, HistoryStack};
use crate::keybindings::{Focus, KeyBindings, KeyCombo, ShortcutAction};
use crate::layout::{LayoutController, LayoutMode, LayoutTransition, ViewportRole};
use crate::registry::{RequestStatus, ViewportDescriptor, ViewportId, ViewportRegistry};
use crate::stack::{StackAssignment, StackEntry, StackPlan};
use crate::tools::{ToolCommand, ToolCoordinator, ToolEntry, ToolKey, ToolTransition};

/// What a stack operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackUpdate {
    /// Already in the requested state; no engine command was issued
    Unchanged,
    /// Another image of the resident stack is now presented
    IndexChanged(usize),
    /// A load was issued and is in flight
    Loading(RequestToken),
}

/// How a load completion was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadCompletion {
    /// Stack committed; `displayed` is now presented
    Applied {
        /// Presented image, if any
        displayed: Option<ImageId>,
    },
    /// Load failed; the previous displayed reference is kept
    Failed(EngineError),
    /// A newer load was issued since; ignored
    Superseded,
    /// Viewport no longer exists; ignored
    Discarded,
}

/// Result of handling one engine event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// A stack load finished
    Load {
        /// Viewport the load targeted
        viewport: ViewportId,
        /// How the completion was handled
        completion: LoadCompletion,
    },
    /// A camera moved
    Zoom {
        /// Viewport whose camera moved
        viewport: ViewportId,
        /// Reported zoom
        zoom: f32,
        /// False if the viewport is unknown
        recorded: bool,
    },
}

/// Result of a fire-once command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// No image displayed anywhere; nothing happened
    Disabled,
    /// Inversion toggled on these viewports
    Inverted {
        /// Affected viewports
        viewports: Vec<ViewportId>,
    },
    /// Camera and display properties reset on these viewports
    Reset {
        /// Affected viewports
        viewports: Vec<ViewportId>,
    },
    /// Undo or redo
    History(HistoryOutcome),
    /// Caller should open the export dialog
    ExportRequested,
    /// Caller should open the settings dialog
    SettingsRequested,
}

/// Result of a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Payload carried no image
    Ignored,
    /// Image was routed to the destination viewport
    Assigned(StackUpdate),
}

/// Result of a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Unbound combo or editable focus
    Ignored,
    /// A tool was selected
    Tool(ToolTransition),
    /// A command ran
    Command(CommandOutcome),
    /// The layout changed
    Layout(LayoutTransition),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Ready,
    ShutDown,
}

/// The coordination engine for one viewer session.
pub struct Workspace<E, T, H> {
    engine: E,
    tools: T,
    history: HistoryBridge<H>,
    catalog: ImageCatalog,
    registry: ViewportRegistry,
    stacks: StackAssignment,
    coordinator: ToolCoordinator,
    layout: LayoutController,
    keybindings: KeyBindings,
    export_prefix: String,
    include_annotations: bool,
    lifecycle: Lifecycle,
    last_token: u64,
}

impl<E, T, H> Workspace<E, T, H>
where
    E: RenderingEngine,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    /// Create a workspace with default settings. Call [`initialize`](Self::initialize)
    /// before anything else.
    pub fn new(engine: E, tools: T, history: H) -> Self {
        Self {
            engine,
            tools,
            history: HistoryBridge::new(history, HistoryGate::default()),
            catalog: ImageCatalog::new(),
            registry: ViewportRegistry::new(),
            stacks: StackAssignment::new(),
            coordinator: ToolCoordinator::new(),
            layout: LayoutController::new(LayoutMode::default()),
            keybindings: KeyBindings::default(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
            include_annotations: true,
            lifecycle: Lifecycle::Created,
            last_token: 0,
        }
    }

    /// Create a workspace from a configuration.
    pub fn with_config(engine: E, tools: T, history: H, config: &ViewerConfig) -> Result<Self> {
        let prefs = &config.preferences;
        let mut workspace = Self::new(engine, tools, history);
        workspace.keybindings = config.keybindings.to_keybindings()?;
        workspace.layout = LayoutController::new(prefs.default_layout);
        workspace.history.set_gate(prefs.history_gate);
        workspace.export_prefix = prefs.export_prefix.clone();
        workspace.include_annotations = prefs.include_annotations;
        Ok(workspace)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Bring the engine up, register tools and create the layout's viewports.
    ///
    /// Calling it again on a ready workspace is a no-op. A workspace that was
    /// shut down cannot be revived.
    pub fn initialize(&mut self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Ready => {
                log::debug!("Workspace already initialized");
                return Ok(());
            }
            Lifecycle::ShutDown => return Err(ViewerError::EngineUnavailable),
            Lifecycle::Created => {}
        }

        self.engine.initialize()?;
        self.registry
            .register_tools(&mut self.tools, &ToolKey::engine_names())?;
        self.lifecycle = Lifecycle::Ready;

        let mode = self.layout.mode();
        self.reconcile(mode)?;
        log::info!("🚀 Workspace initialized with {} layout", mode);
        Ok(())
    }

    /// Tear down every viewport and destroy the engine. Runs at most once.
    pub fn shutdown(&mut self) {
        match self.lifecycle {
            Lifecycle::ShutDown => return,
            Lifecycle::Created => {
                self.lifecycle = Lifecycle::ShutDown;
                return;
            }
            Lifecycle::Ready => {}
        }

        for id in self.registry.ids() {
            if let Err(e) = self.registry.teardown(&mut self.engine, &mut self.tools, &id) {
                log::warn!("Teardown of {} failed: {}", id, e);
            }
        }
        self.stacks.clear();
        self.coordinator = ToolCoordinator::new();
        self.engine.destroy();
        self.lifecycle = Lifecycle::ShutDown;
        log::info!("👋 Workspace shut down");
    }

    /// Initialize and return a guard that shuts down when dropped.
    pub fn session(&mut self) -> Result<Session<'_, E, T, H>> {
        self.initialize()?;
        Ok(Session { workspace: self })
    }

    /// Whether the workspace is initialized and not shut down.
    pub fn is_ready(&self) -> bool {
        self.lifecycle == Lifecycle::Ready
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Snapshot of one viewport.
    pub fn viewport(&self, id: &ViewportId) -> Option<ViewportDescriptor> {
        let record = self.registry.get(id)?;
        let entry = self.stacks.entry(id);
        Some(ViewportDescriptor {
            id: id.clone(),
            role: record.role,
            enabled: record.enabled,
            loading: record.loading,
            zoom: record.zoom,
            displayed_reference: entry.and_then(|e| e.displayed_reference()).cloned(),
            displayed_index: entry.and_then(|e| e.displayed_index()),
            is_fresh: record.is_fresh,
            inverted: record.inverted,
        })
    }

    /// Snapshots of all viewports, primary first.
    pub fn viewports(&self) -> Vec<ViewportDescriptor> {
        self.registry
            .ids()
            .iter()
            .filter_map(|id| self.viewport(id))
            .collect()
    }

    /// Id of the primary viewport.
    pub fn primary_id(&self) -> ViewportId {
        ViewportId::from(PRIMARY_VIEWPORT_ID)
    }

    /// The image catalog.
    pub fn catalog(&self) -> &ImageCatalog {
        &self.catalog
    }

    /// Stack state of a viewport.
    pub fn stack(&self, id: &ViewportId) -> Option<&StackEntry> {
        self.stacks.entry(id)
    }

    /// Whether any viewport presents an image.
    pub fn image_displayed(&self) -> bool {
        self.stacks.displayed_anywhere()
    }

    /// Current layout.
    pub fn layout_mode(&self) -> LayoutMode {
        self.layout.mode()
    }

    /// Active exclusive tool.
    pub fn active_tool(&self) -> Option<ToolKey> {
        self.coordinator.active_tool()
    }

    /// Shortcut table.
    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Shortcut table, mutably.
    pub fn keybindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.keybindings
    }

    /// The rendering engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The rendering engine, mutably. Used by hosts to feed user input.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The tool group.
    pub fn tools(&self) -> &T {
        &self.tools
    }

    /// The history stack.
    pub fn history(&self) -> &H {
        self.history.history()
    }

    /// The history stack, mutably. Used by hosts to record edits.
    pub fn history_mut(&mut self) -> &mut H {
        self.history.history_mut()
    }

    // =========================================================================
    // Stack assignment
    // =========================================================================

    /// Add images to the catalog and show the whole catalog in the primary
    /// viewport.
    ///
    /// The displayed image is kept if it is still in the catalog, otherwise
    /// the first image is shown.
    pub fn import_images(
        &mut self,
        references: impl IntoIterator<Item = ImageReference>,
    ) -> Result<StackUpdate> {
        self.ensure_ready()?;
        let primary = self.primary_id();
        self.ensure_viewport(&primary)?;

        let added = self.catalog.extend(references);
        log::info!(
            "📂 Imported {} images ({} in catalog)",
            added.len(),
            self.catalog.len()
        );
        if self.catalog.is_empty() {
            return Ok(StackUpdate::Unchanged);
        }

        let plan = self.stacks.plan_replace(&primary, self.catalog.ids(), Some(0))?;
        self.apply_plan(&primary, plan)
    }

    /// Import the built-in remote demo images.
    pub fn import_demo(&mut self) -> Result<StackUpdate> {
        self.import_images(demo_references())
    }

    /// Replace a viewport's stack, keeping the displayed image if it is
    /// still a member.
    pub fn set_stack(&mut self, id: &ViewportId, stack: Vec<ImageId>) -> Result<StackUpdate> {
        self.ensure_ready()?;
        self.ensure_viewport(id)?;
        let plan = self.stacks.plan_set_stack(id, stack)?;
        self.apply_plan(id, plan)
    }

    /// Present an image in a viewport.
    ///
    /// A member of the current stack is an index change; anything else
    /// replaces the stack with just that image.
    pub fn select_reference(
        &mut self,
        id: &ViewportId,
        reference: &ImageId,
    ) -> Result<StackUpdate> {
        self.ensure_ready()?;
        self.ensure_viewport(id)?;
        let plan = self.stacks.plan_select(id, reference)?;
        self.apply_plan(id, plan)
    }

    fn apply_plan(&mut self, id: &ViewportId, plan: StackPlan) -> Result<StackUpdate> {
        match plan {
            StackPlan::Unchanged => {
                log::trace!("Stack of {} unchanged", id);
                Ok(StackUpdate::Unchanged)
            }
            StackPlan::ChangeIndex(index) => {
                self.engine
                    .set_image_index(id, index)
                    .map_err(|e| ViewerError::load_failure(id, e.to_string()))?;
                self.stacks.commit_index(id, index)?;
                self.registry.mark_populated(id);
                self.render(id);
                log::debug!("Viewport {} shows index {}", id, index);
                Ok(StackUpdate::IndexChanged(index))
            }
            StackPlan::Load { stack, displayed } => self.issue_load(id, stack, displayed),
        }
    }

    fn issue_load(
        &mut self,
        id: &ViewportId,
        stack: Vec<ImageId>,
        displayed: Option<usize>,
    ) -> Result<StackUpdate> {
        let token = self.next_token();
        self.stacks.begin_load(id, token, stack.clone(), displayed)?;
        self.registry.begin_request(id, token)?;

        if let Err(e) = self.engine.load_stack(id, &stack, displayed, token) {
            self.stacks.fail_load(id, token);
            self.registry.finish_request(id, token);
            log::error!("Engine rejected load {} into {}: {}", token, id, e);
            return Err(ViewerError::load_failure(id, e.to_string()));
        }

        log::debug!(
            "⏳ Load {} issued: {} images into {} (index {:?})",
            token,
            stack.len(),
            id,
            displayed
        );
        Ok(StackUpdate::Loading(token))
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken::new(self.last_token)
    }

    // =========================================================================
    // Engine events
    // =========================================================================

    /// Handle one engine event.
    pub fn handle_event(&mut self, event: EngineEvent) -> Result<EventOutcome> {
        match event {
            EngineEvent::StackLoaded {
                viewport,
                token,
                result,
            } => {
                let completion = self.complete_load(&viewport, token, result)?;
                Ok(EventOutcome::Load {
                    viewport,
                    completion,
                })
            }
            EngineEvent::CameraChanged { viewport, zoom } => {
                let recorded = self.registry.record_zoom(&viewport, zoom);
                if !recorded {
                    log::debug!("Camera event for unknown viewport {} ignored", viewport);
                }
                Ok(EventOutcome::Zoom {
                    viewport,
                    zoom,
                    recorded,
                })
            }
        }
    }

    /// Settle a load completion.
    ///
    /// Completions for torn-down viewports and superseded requests are
    /// ignored and leave `loading` alone.
    pub fn complete_load(
        &mut self,
        id: &ViewportId,
        token: RequestToken,
        result: std::result::Result<(), EngineError>,
    ) -> Result<LoadCompletion> {
        match self.registry.finish_request(id, token) {
            RequestStatus::Unknown => {
                log::debug!("Completion {} for removed viewport {} ignored", token, id);
                return Ok(LoadCompletion::Discarded);
            }
            RequestStatus::Stale => {
                log::debug!("Completion {} for {} superseded", token, id);
                return Ok(LoadCompletion::Superseded);
            }
            RequestStatus::Current => {}
        }

        if let Err(e) = result {
            self.stacks.fail_load(id, token);
            log::error!("Load {} into {} failed: {}", token, id, e);
            return Ok(LoadCompletion::Failed(e));
        }

        let displayed = match self.stacks.complete_load(id, token) {
            Some(entry) => entry.displayed_reference().cloned(),
            None => {
                return Err(ViewerError::invariant(format!(
                    "load {} for {} has no pending stack",
                    token, id
                )));
            }
        };
        if displayed.is_some() {
            self.registry.mark_populated(id);
        }
        self.render(id);
        log::debug!("✅ Load {} into {} applied", token, id);
        Ok(LoadCompletion::Applied { displayed })
    }

    /// Drain and handle every pending engine event.
    pub fn pump(&mut self) -> Result<Vec<EventOutcome>> {
        self.ensure_ready()?;
        let events = self.engine.poll_events();
        events
            .into_iter()
            .map(|event| self.handle_event(event))
            .collect()
    }

    // =========================================================================
    // Tools and commands
    // =========================================================================

    /// Select an exclusive tool, toggling it off if it is already active.
    pub fn select_tool(&mut self, key: ToolKey) -> Result<ToolTransition> {
        self.ensure_ready()?;
        let enabled = self.stacks.displayed_anywhere();
        self.coordinator.select(&mut self.tools, key, enabled)
    }

    /// Run a fire-once command. The active tool is never changed.
    pub fn run_command(&mut self, command: ToolCommand) -> Result<CommandOutcome> {
        self.ensure_ready()?;
        match command {
            ToolCommand::Undo => return Ok(CommandOutcome::History(self.undo()?)),
            ToolCommand::Redo => return Ok(CommandOutcome::History(self.redo()?)),
            _ => {}
        }
        if !self.stacks.displayed_anywhere() {
            log::debug!("Command '{}' ignored, nothing displayed", command.key());
            return Ok(CommandOutcome::Disabled);
        }

        match command {
            ToolCommand::Invert => {
                let mut viewports = Vec::new();
                for id in self.displaying_viewports() {
                    let inverted = self.registry.get(&id).is_some_and(|r| !r.inverted);
                    match self.engine.set_inverted(&id, inverted) {
                        Ok(()) => {
                            self.registry.set_inverted(&id, inverted)?;
                            self.render(&id);
                            viewports.push(id);
                        }
                        Err(e) => log::error!("Invert of {} failed: {}", id, e),
                    }
                }
                log::debug!("🌓 Toggled inversion on {} viewports", viewports.len());
                Ok(CommandOutcome::Inverted { viewports })
            }
            ToolCommand::Reset => {
                let mut viewports = Vec::new();
                for id in self.displaying_viewports() {
                    let reset = self
                        .engine
                        .reset_camera(&id)
                        .and_then(|()| self.engine.reset_properties(&id));
                    match reset {
                        Ok(()) => {
                            self.registry.set_inverted(&id, false)?;
                            self.render(&id);
                            viewports.push(id);
                        }
                        Err(e) => log::error!("Reset of {} failed: {}", id, e),
                    }
                }
                log::debug!("🔄 Reset {} viewports", viewports.len());
                Ok(CommandOutcome::Reset { viewports })
            }
            ToolCommand::Export => Ok(CommandOutcome::ExportRequested),
            ToolCommand::Settings => Ok(CommandOutcome::SettingsRequested),
            ToolCommand::Undo | ToolCommand::Redo => Err(ViewerError::invariant(
                "history command reached the view command path",
            )),
        }
    }

    /// Run a catalog entry by key, e.g. `"length"` or `"invert"`.
    pub fn run_entry(&mut self, entry: ToolEntry) -> Result<KeyOutcome> {
        match entry {
            ToolEntry::Tool(key) => Ok(KeyOutcome::Tool(self.select_tool(key)?)),
            ToolEntry::Command(command) => Ok(KeyOutcome::Command(self.run_command(command)?)),
        }
    }

    /// Resolve and run a key press.
    pub fn handle_key(&mut self, combo: KeyCombo, focus: Focus) -> Result<KeyOutcome> {
        self.ensure_ready()?;
        match self.keybindings.dispatch(combo, focus) {
            None => Ok(KeyOutcome::Ignored),
            Some(ShortcutAction::Tool(entry)) => self.run_entry(entry),
            Some(ShortcutAction::Layout(mode)) => Ok(KeyOutcome::Layout(self.set_layout(mode)?)),
        }
    }

    fn displaying_viewports(&self) -> Vec<ViewportId> {
        self.stacks
            .displaying_viewports()
            .into_iter()
            .filter(|id| self.registry.is_enabled(id))
            .collect()
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Whether undo would be forwarded.
    pub fn can_undo(&self) -> bool {
        self.is_ready() && self.history.can_undo(self.stacks.displayed_anywhere())
    }

    /// Whether redo would be forwarded.
    pub fn can_redo(&self) -> bool {
        self.is_ready() && self.history.can_redo(self.stacks.displayed_anywhere())
    }

    /// Forward an undo to the history.
    pub fn undo(&mut self) -> Result<HistoryOutcome> {
        self.ensure_ready()?;
        let displayed = self.stacks.displayed_anywhere();
        Ok(self.history.undo(displayed))
    }

    /// Forward a redo to the history.
    pub fn redo(&mut self) -> Result<HistoryOutcome> {
        self.ensure_ready()?;
        let displayed = self.stacks.displayed_anywhere();
        Ok(self.history.redo(displayed))
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Switch layout. Setting the current layout changes nothing.
    ///
    /// The primary viewport is never touched; new secondaries start with the
    /// primary's stack and nothing displayed.
    pub fn set_layout(&mut self, mode: LayoutMode) -> Result<LayoutTransition> {
        self.ensure_ready()?;
        self.reconcile(mode)
    }

    /// Step single → dual → quad → single.
    pub fn cycle_layout(&mut self) -> Result<LayoutTransition> {
        let next = self.layout.mode().next();
        self.set_layout(next)
    }

    /// Bring the viewport set in line with `mode`.
    ///
    /// Per-viewport failures are logged and skipped so the rest of the
    /// transition still happens. The mode is always committed; viewports that
    /// could not be created are retried by the next `set_layout`, and the
    /// first creation error is returned.
    fn reconcile(&mut self, mode: LayoutMode) -> Result<LayoutTransition> {
        let mut transition = self
            .layout
            .plan(mode, self.registry.iter().map(|(id, _)| id));

        for id in &transition.removed {
            if let Err(e) = self.teardown_viewport(id) {
                log::warn!("Teardown of {} failed: {}", id, e);
            }
        }

        let mut first_error = None;
        let mut created = Vec::with_capacity(transition.created.len());
        for (id, role) in transition.created.drain(..) {
            match self.create_viewport(&id, role) {
                Ok(()) => created.push((id, role)),
                Err(e) => {
                    log::error!("Could not create viewport {}: {}", id, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        transition.created = created;
        self.layout.commit(mode);

        match first_error {
            Some(e) => Err(e),
            None => Ok(transition),
        }
    }

    fn create_viewport(&mut self, id: &ViewportId, role: ViewportRole) -> Result<()> {
        self.registry
            .enable(&mut self.engine, &mut self.tools, id, role)?;

        match role {
            ViewportRole::Primary => {
                self.stacks.ensure(id);
            }
            ViewportRole::Secondary => {
                let seed = self
                    .stacks
                    .entry(&self.primary_id())
                    .map(|entry| entry.intended_stack().to_vec())
                    .unwrap_or_default();
                self.stacks.seed(id, seed.clone());
                if seed.is_empty() {
                    return Ok(());
                }
                if let Err(e) = self.issue_load(id, seed, None) {
                    log::warn!("Seeding {} failed: {}", id, e);
                }
            }
        }
        Ok(())
    }

    fn teardown_viewport(&mut self, id: &ViewportId) -> Result<()> {
        let last = self
            .registry
            .teardown(&mut self.engine, &mut self.tools, id)?;
        self.stacks.remove(id);
        if last {
            self.stacks.clear();
        }
        Ok(())
    }

    // =========================================================================
    // Drag and drop
    // =========================================================================

    /// Route a dropped image to a viewport.
    pub fn drop_image(
        &mut self,
        payload: &DropPayload,
        destination: &ViewportId,
    ) -> Result<DropOutcome> {
        self.ensure_ready()?;
        let Some(request) = resolve_drop(payload, destination, &self.registry)? else {
            return Ok(DropOutcome::Ignored);
        };
        if !self.catalog.contains(&request.source) {
            log::warn!("Dropped image {} is not in the catalog", request.source);
        }
        let update = self.select_reference(&request.destination, &request.source)?;
        Ok(DropOutcome::Assigned(update))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn render(&mut self, id: &ViewportId) {
        if let Err(e) = self.engine.render(id) {
            log::error!("Render of {} failed: {}", id, e);
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ViewerError::EngineUnavailable)
        }
    }

    fn ensure_viewport(&self, id: &ViewportId) -> Result<()> {
        if self.registry.is_enabled(id) {
            Ok(())
        } else {
            log::warn!("Unknown viewport {}", id);
            Err(ViewerError::viewport_not_found(id))
        }
    }
}

impl<E, T, H> Workspace<E, T, H>
where
    E: RenderingEngine + FrameCapture,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    /// Export request prefilled from preferences.
    pub fn export_request(&self) -> ExportRequest {
        ExportRequest::new()
            .file_name(default_file_name(&self.export_prefix))
            .include_annotations(self.include_annotations)
    }

    /// Flatten a viewport into a PNG artifact.
    ///
    /// Leaves all coordination state untouched, so a failed export can be
    /// retried.
    pub fn export(&self, id: &ViewportId, request: &ExportRequest) -> Result<ExportArtifact> {
        self.ensure_ready()?;
        if !self.registry.is_enabled(id) {
            log::warn!("Export of unknown viewport {}", id);
            return Err(ViewerError::export_failed(
                ExportFailureReason::NoViewport,
                format!("viewport {} does not exist", id),
            ));
        }
        let displays = self
            .stacks
            .entry(id)
            .and_then(|entry| entry.displayed_reference())
            .is_some();
        if !displays {
            return Err(ViewerError::export_failed(
                ExportFailureReason::NoCanvas,
                format!("viewport {} displays no image", id),
            ));
        }

        ExportCompositor::export(&self.engine, id, request).inspect_err(|e| {
            log::warn!("Export of {} failed: {}", id, e);
        })
    }
}

/// Initialized workspace that shuts down when dropped.
pub struct Session<'a, E, T, H>
where
    E: RenderingEngine,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    workspace: &'a mut Workspace<E, T, H>,
}

impl<E, T, H> Deref for Session<'_, E, T, H>
where
    E: RenderingEngine,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    type Target = Workspace<E, T, H>;

    fn deref(&self) -> &Self::Target {
        self.workspace
    }
}

impl<E, T, H> DerefMut for Session<'_, E, T, H>
where
    E: RenderingEngine,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.workspace
    }
}

impl<E, T, H> Drop for Session<'_, E, T, H>
where
    E: RenderingEngine,
    T: ToolGroupHandle,
    H: HistoryStack,
{
    fn drop(&mut self) {
        self.workspace.shutdown();
    }
}

#[cfg(test)]
mod tests;
