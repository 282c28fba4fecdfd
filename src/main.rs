//! SensVuer headless session driver.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use sensvuer::config::LogLevel;
use sensvuer::constants::PRIMARY_VIEWPORT_ID;
use sensvuer::dragdrop::DropPayload;
use sensvuer::headless::{HeadlessEngine, HeadlessToolGroup, UndoStack};
use sensvuer::{
    EventOutcome, ImageId, ImageReference, LayoutMode, LoadCompletion, Result, ToolEntry,
    ViewerConfig, ViewportId, ViewportRole, Workspace,
};

type HeadlessWorkspace = Workspace<HeadlessEngine, HeadlessToolGroup, UndoStack>;

/// Arrange images in a comparison layout and export a viewport to PNG.
#[derive(Parser, Debug)]
#[command(name = "sensvuer", version, about)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Layout: single, dual or quad
    #[arg(long)]
    layout: Option<LayoutMode>,

    /// Image to drop onto the next secondary viewport (repeatable)
    #[arg(long = "drop", value_name = "IMAGE")]
    drops: Vec<PathBuf>,

    /// Tool or command to run once everything is loaded, e.g. length or invert
    #[arg(long)]
    tool: Option<ToolEntry>,

    /// Viewport to export
    #[arg(long, default_value = PRIMARY_VIEWPORT_ID)]
    viewport: String,

    /// Directory to write the export to; nothing is exported without it
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Export file name (default: timestamped)
    #[arg(long)]
    name: Option<String>,

    /// Leave annotation overlays out of the export
    #[arg(long)]
    no_annotations: bool,

    /// Import the remote demo images as well
    #[arg(long)]
    demo: bool,

    /// Images to import into the primary viewport
    images: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.preferences.log_level);

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path),
        None => match ViewerConfig::default_path() {
            Some(path) => ViewerConfig::load_or_default(&path),
            None => Ok(ViewerConfig::default()),
        },
    }
}

/// Config level applies unless RUST_LOG is set.
fn init_logging(level: LogLevel) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn run(cli: &Cli, config: &ViewerConfig) -> Result<()> {
    let mut workspace = Workspace::with_config(
        HeadlessEngine::new(),
        HeadlessToolGroup::new(),
        UndoStack::new(),
        config,
    )?;
    let mut session = workspace.session()?;

    if cli.demo {
        session.import_demo()?;
    }
    if !cli.images.is_empty() {
        session.import_images(cli.images.iter().map(|p| ImageReference::from_path(p)))?;
    }
    settle(&mut session)?;

    if let Some(layout) = cli.layout {
        session.set_layout(layout)?;
    }

    let secondaries: Vec<ViewportId> = session
        .viewports()
        .into_iter()
        .filter(|v| v.role == ViewportRole::Secondary)
        .map(|v| v.id)
        .collect();
    if cli.drops.len() > secondaries.len() {
        log::warn!(
            "{} drops but only {} secondary viewports in {} layout",
            cli.drops.len(),
            secondaries.len(),
            session.layout_mode()
        );
    }
    for (path, target) in cli.drops.iter().zip(&secondaries) {
        let payload = DropPayload::for_image(&ImageId::from_path(path));
        session.drop_image(&payload, target)?;
    }
    settle(&mut session)?;

    if let Some(entry) = cli.tool {
        let outcome = session.run_entry(entry)?;
        log::info!("Ran '{}': {:?}", entry, outcome);
    }

    for viewport in session.viewports() {
        let shown = viewport
            .displayed_reference
            .as_ref()
            .and_then(|id| session.catalog().display_name(id).map(str::to_string))
            .or_else(|| viewport.displayed_reference.as_ref().map(ImageId::to_string))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<22} {:<9} {}",
            viewport.id.as_str(),
            format!("{:?}", viewport.role),
            shown
        );
    }

    if let Some(dir) = &cli.output {
        let mut request = session.export_request();
        if let Some(name) = &cli.name {
            request = request.file_name(name.clone());
        }
        if cli.no_annotations {
            request = request.include_annotations(false);
        }
        let artifact = session.export(&ViewportId::new(cli.viewport.clone()), &request)?;
        let path = artifact.write_to(dir)?;
        println!("Exported {}", path.display());
    }

    Ok(())
}

/// Handle every pending engine event, reporting failed loads.
fn settle(workspace: &mut HeadlessWorkspace) -> Result<()> {
    for outcome in workspace.pump()? {
        if let EventOutcome::Load {
            viewport,
            completion: LoadCompletion::Failed(e),
        } = outcome
        {
            log::warn!("Could not load into {}: {}", viewport, e);
        }
    }
    Ok(())
}
