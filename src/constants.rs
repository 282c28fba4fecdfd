//! Global constants for the SensVuer coordination engine

/// Identifier of the primary viewport, present in every layout
pub const PRIMARY_VIEWPORT_ID: &str = "primary_viewport";

/// Identifiers of the secondary viewports, in the order layouts introduce them
pub const SECONDARY_VIEWPORT_IDS: [&str; 3] = [
    "secondary_viewport_a",
    "secondary_viewport_b",
    "secondary_viewport_c",
];

/// Drag payload key carrying the source image identifier
pub const DRAG_IMAGE_KEY: &str = "imageId";

/// Zoom readout reported before the engine publishes a camera event
pub const DEFAULT_ZOOM: f32 = 1.0;

/// Prefix of the default export file name
pub const DEFAULT_EXPORT_PREFIX: &str = "sensvuer-export";

/// Extension of exported raster artifacts
pub const EXPORT_EXTENSION: &str = "png";

/// Default number of entries kept by the headless undo stack
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Config directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "sensvuer";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";
