//! Workspace behavior, driven through the headless adapter and a recording
//! engine.

mod common;

use super::*;
use crate::catalog::DEMO_IMAGE_URLS;
use crate::headless::{HeadlessEngine, HeadlessToolGroup, UndoStack};
use common::{import, manual_workspace, workspace};

#[test]
fn test_operations_need_initialize() {
    let mut workspace = Workspace::new(
        HeadlessEngine::new(),
        HeadlessToolGroup::new(),
        UndoStack::new(),
    );
    assert!(matches!(
        workspace.set_layout(LayoutMode::Dual),
        Err(ViewerError::EngineUnavailable)
    ));
    assert!(matches!(
        workspace.select_tool(ToolKey::Move),
        Err(ViewerError::EngineUnavailable)
    ));
    assert!(!workspace.can_undo());
}

#[test]
fn test_initialize_is_idempotent() {
    let mut workspace = workspace();
    workspace.initialize().unwrap();
    assert_eq!(workspace.engine().count_calls("initialize"), 1);
    assert_eq!(workspace.viewports().len(), 1);
    assert_eq!(workspace.viewports()[0].role, ViewportRole::Primary);
}

#[test]
fn test_shutdown_runs_once() {
    let mut workspace = workspace();
    workspace.shutdown();
    workspace.shutdown();
    assert_eq!(workspace.engine().count_calls("destroy"), 1);
    assert!(workspace.viewports().is_empty());
    assert!(matches!(
        workspace.initialize(),
        Err(ViewerError::EngineUnavailable)
    ));
}

#[test]
fn test_session_guard_shuts_down() {
    let mut workspace = Workspace::new(
        HeadlessEngine::new(),
        HeadlessToolGroup::new(),
        UndoStack::new(),
    );
    {
        let mut session = workspace.session().unwrap();
        session.set_layout(LayoutMode::Dual).unwrap();
        assert_eq!(session.viewports().len(), 2);
    }
    assert!(!workspace.is_ready());
    assert!(workspace.engine().viewports().is_empty());
}

#[test]
fn test_import_displays_first_image() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();

    let update = workspace
        .import_images(vec![ImageReference::new("A", "a.png")])
        .unwrap();
    assert!(matches!(update, StackUpdate::Loading(_)));
    assert!(workspace.viewport(&primary).unwrap().loading);

    workspace.pump().unwrap();
    let descriptor = workspace.viewport(&primary).unwrap();
    assert!(!descriptor.loading);
    assert_eq!(descriptor.displayed_reference, Some(ImageId::from("A")));
}

#[test]
fn test_second_import_keeps_displayed() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();
    import(&mut workspace, &["A", "B"]);
    workspace.select_reference(&primary, &"B".into()).unwrap();

    import(&mut workspace, &["C"]);
    let descriptor = workspace.viewport(&primary).unwrap();
    assert_eq!(descriptor.displayed_reference, Some(ImageId::from("B")));
    assert_eq!(workspace.stack(&primary).unwrap().stack().len(), 3);
}

#[test]
fn test_unknown_viewport() {
    let mut workspace = workspace();
    assert!(matches!(
        workspace.select_reference(&"nowhere".into(), &"A".into()),
        Err(ViewerError::ViewportNotFound { .. })
    ));
}

#[test]
fn test_failed_load_keeps_previous_image() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();
    import(&mut workspace, &["A"]);

    workspace
        .select_reference(&primary, &ImageId::web("https://example.invalid/x.png"))
        .unwrap();
    let outcomes = workspace.pump().unwrap();
    assert!(matches!(
        &outcomes[0],
        EventOutcome::Load {
            completion: LoadCompletion::Failed(_),
            ..
        }
    ));

    let descriptor = workspace.viewport(&primary).unwrap();
    assert!(!descriptor.loading);
    assert_eq!(descriptor.displayed_reference, Some(ImageId::from("A")));
}

#[test]
fn test_commands_disabled_without_image() {
    let mut workspace = workspace();
    assert_eq!(
        workspace.run_command(ToolCommand::Invert).unwrap(),
        CommandOutcome::Disabled
    );
    assert_eq!(
        workspace.select_tool(ToolKey::Length).unwrap(),
        ToolTransition::Disabled
    );
}

#[test]
fn test_invert_and_reset() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();
    import(&mut workspace, &["A"]);

    let outcome = workspace.run_command(ToolCommand::Invert).unwrap();
    assert_eq!(
        outcome,
        CommandOutcome::Inverted {
            viewports: vec![primary.clone()]
        }
    );
    assert!(workspace.viewport(&primary).unwrap().inverted);
    assert!(workspace.engine().is_inverted(&primary));

    workspace.run_command(ToolCommand::Reset).unwrap();
    assert!(!workspace.viewport(&primary).unwrap().inverted);
    assert!(!workspace.engine().is_inverted(&primary));
}

#[test]
fn test_commands_keep_active_tool() {
    let mut workspace = workspace();
    import(&mut workspace, &["A"]);
    workspace.select_tool(ToolKey::Arrow).unwrap();

    for command in ToolCommand::all() {
        workspace.run_command(*command).unwrap();
        assert_eq!(workspace.active_tool(), Some(ToolKey::Arrow));
    }
}

#[test]
fn test_zoom_events_recorded() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();
    workspace.engine_mut().set_zoom(&primary, 2.0).unwrap();
    workspace.pump().unwrap();
    assert_eq!(workspace.viewport(&primary).unwrap().zoom, 2.0);
}

#[test]
fn test_handle_key() {
    let mut workspace = workspace();
    import(&mut workspace, &["A"]);

    let outcome = workspace.handle_key(KeyCombo::new('l'), Focus::Viewer).unwrap();
    assert_eq!(outcome, KeyOutcome::Tool(ToolTransition::Activated(ToolKey::Length)));

    let outcome = workspace.handle_key(KeyCombo::new('4'), Focus::Editable).unwrap();
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert_eq!(workspace.layout_mode(), LayoutMode::Single);

    let outcome = workspace.handle_key(KeyCombo::new('4'), Focus::Viewer).unwrap();
    assert!(matches!(outcome, KeyOutcome::Layout(_)));
    assert_eq!(workspace.layout_mode(), LayoutMode::Quad);
}

#[test]
fn test_with_config() {
    let mut config = ViewerConfig::new();
    config.preferences.default_layout = LayoutMode::Dual;
    config.preferences.export_prefix = "scan".to_string();
    let mut workspace = Workspace::with_config(
        HeadlessEngine::new(),
        HeadlessToolGroup::new(),
        UndoStack::new(),
        &config,
    )
    .unwrap();
    workspace.initialize().unwrap();

    assert_eq!(workspace.layout_mode(), LayoutMode::Dual);
    assert_eq!(workspace.viewports().len(), 2);
    assert!(workspace.export_request().file_name.starts_with("scan-"));
}

#[test]
fn test_export_reasons() {
    let mut workspace = workspace();
    let primary = workspace.primary_id();
    let request = ExportRequest::new().file_name("out");

    let err = workspace.export(&primary, &request).unwrap_err();
    assert_eq!(err.export_reason(), Some(ExportFailureReason::NoCanvas));
    let err = workspace.export(&"ghost".into(), &request).unwrap_err();
    assert_eq!(err.export_reason(), Some(ExportFailureReason::NoViewport));

    import(&mut workspace, &["A"]);
    let artifact = workspace.export(&primary, &request).unwrap();
    assert_eq!(artifact.file_name, "out.png");
    assert_eq!((artifact.width, artifact.height), (8, 6));
}

#[test]
fn test_import_demo() {
    let mut workspace = manual_workspace();
    let primary = workspace.primary_id();

    let update = workspace.import_demo().unwrap();
    assert!(matches!(update, StackUpdate::Loading(_)));
    assert_eq!(workspace.catalog().len(), DEMO_IMAGE_URLS.len());
    let entry = workspace.stack(&primary).unwrap();
    assert_eq!(entry.intended_stack().len(), DEMO_IMAGE_URLS.len());
    assert_eq!(entry.pending().unwrap().displayed, Some(0));

    // A second import adds nothing new and keeps the stack
    workspace.import_demo().unwrap();
    assert_eq!(workspace.catalog().len(), DEMO_IMAGE_URLS.len());
}
