//! Shared fixtures for workspace tests.

use crate::headless::{HeadlessEngine, HeadlessToolGroup, UndoStack};
use crate::{ImageReference, ViewportId, Workspace};

pub type TestWorkspace = Workspace<HeadlessEngine, HeadlessToolGroup, UndoStack>;

/// Images every fixture engine can render.
pub const IMAGES: [&str; 5] = ["A", "B", "C", "D", "E"];

fn engine_with_images(mut engine: HeadlessEngine) -> HeadlessEngine {
    for (i, name) in IMAGES.iter().enumerate() {
        let shade = 40 * (i as u8 + 1);
        engine.insert_solid(*name, 8, 6, [shade, shade, shade, 255]);
    }
    engine
}

/// Initialized workspace whose loads complete on `pump`.
pub fn workspace() -> TestWorkspace {
    let engine = engine_with_images(HeadlessEngine::new());
    let mut workspace = Workspace::new(engine, HeadlessToolGroup::new(), UndoStack::new());
    workspace.initialize().unwrap();
    workspace
}

/// Initialized workspace whose loads complete only when resolved by the test.
pub fn manual_workspace() -> TestWorkspace {
    let engine = engine_with_images(HeadlessEngine::manual());
    let mut workspace = Workspace::new(engine, HeadlessToolGroup::new(), UndoStack::new());
    workspace.initialize().unwrap();
    workspace
}

pub fn references(names: &[&str]) -> Vec<ImageReference> {
    names
        .iter()
        .map(|name| ImageReference::new(*name, format!("{}.png", name)))
        .collect()
}

/// Import images and let every load finish.
pub fn import(workspace: &mut TestWorkspace, names: &[&str]) {
    workspace.import_images(references(names)).unwrap();
    workspace.pump().unwrap();
}

pub fn primary() -> ViewportId {
    ViewportId::from("primary_viewport")
}

pub fn secondary(suffix: char) -> ViewportId {
    ViewportId::new(format!("secondary_viewport_{}", suffix))
}

/// Import images into a manual workspace and resolve every load.
pub fn import_manual(workspace: &mut TestWorkspace, names: &[&str]) {
    workspace.import_images(references(names)).unwrap();
    for event in workspace.engine_mut().resolve_all() {
        workspace.handle_event(event).unwrap();
    }
}
