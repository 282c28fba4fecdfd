//! Export Compositor: flatten a viewport's frame and overlays into a PNG.
//!
//! An export either produces a complete artifact or fails with a reason code.
//! Nothing is written and no coordination state changes on failure, so the
//! caller can retry.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::constants::{DEFAULT_EXPORT_PREFIX, EXPORT_EXTENSION};
use crate::engine::{FrameCapture, OverlayLayer};
use crate::error::{Result, ViewerError};
use crate::registry::ViewportId;

/// Stable reason codes for export failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFailureReason {
    /// No frame could be captured
    NoCanvas,
    /// Target viewport does not exist
    NoViewport,
    /// PNG encoding failed
    EncodeError,
}

impl ExportFailureReason {
    /// The kebab-case reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoCanvas => "no-canvas",
            Self::NoViewport => "no-viewport",
            Self::EncodeError => "encode-error",
        }
    }
}

impl fmt::Display for ExportFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Default export file name (without extension): `<prefix>-<unix millis>`.
pub fn default_file_name(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{}-{}", prefix, millis)
}

/// Options for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// User-editable file name, with or without the `.png` extension
    pub file_name: String,
    /// Composite annotation overlays over the frame
    pub include_annotations: bool,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            file_name: default_file_name(DEFAULT_EXPORT_PREFIX),
            include_annotations: true,
        }
    }
}

impl ExportRequest {
    /// Create a request with a timestamped default name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Include or skip annotation overlays.
    pub fn include_annotations(mut self, include: bool) -> Self {
        self.include_annotations = include;
        self
    }

    /// The file name with the `.png` extension ensured.
    ///
    /// A blank name falls back to the timestamped default.
    pub fn file_name_with_extension(&self) -> String {
        let trimmed = self.file_name.trim();
        let base = if trimmed.is_empty() {
            default_file_name(DEFAULT_EXPORT_PREFIX)
        } else {
            trimmed.to_string()
        };
        let suffix = format!(".{}", EXPORT_EXTENSION);
        if base.to_lowercase().ends_with(&suffix) {
            base
        } else {
            format!("{}{}", base, suffix)
        }
    }
}

/// Encoded output of a successful export.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// File name including extension
    pub file_name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// PNG bytes
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into a directory, returning the written path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let Some(name) = Path::new(&self.file_name).file_name() else {
            return Err(ViewerError::export_failed(
                ExportFailureReason::EncodeError,
                format!("'{}' is not a file name", self.file_name),
            ));
        };
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        log::info!(
            "💾 Exported {}x{} image to {:?}",
            self.width,
            self.height,
            path
        );
        Ok(path)
    }
}

/// Capture, composite and encode.
pub struct ExportCompositor;

impl ExportCompositor {
    /// Export one viewport.
    ///
    /// The caller has already checked that the viewport exists; a capture
    /// failure here is reported as `no-canvas`.
    pub fn export<C: FrameCapture>(
        capture: &C,
        viewport: &ViewportId,
        request: &ExportRequest,
    ) -> Result<ExportArtifact> {
        let frame = capture.capture_frame(viewport).map_err(|e| {
            ViewerError::export_failed(ExportFailureReason::NoCanvas, e.to_string())
        })?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ViewerError::export_failed(
                ExportFailureReason::NoCanvas,
                format!("viewport {} rendered an empty frame", viewport),
            ));
        }

        let overlays = if request.include_annotations {
            capture.capture_overlays(viewport).map_err(|e| {
                ViewerError::export_failed(ExportFailureReason::NoCanvas, e.to_string())
            })?
        } else {
            Vec::new()
        };

        let composed = Self::compose(frame, overlays);
        let bytes = Self::encode_png(&composed)?;
        log::debug!(
            "Composed export of {} ({}x{}, {} bytes)",
            viewport,
            composed.width(),
            composed.height(),
            bytes.len()
        );

        Ok(ExportArtifact {
            file_name: request.file_name_with_extension(),
            width: composed.width(),
            height: composed.height(),
            bytes,
        })
    }

    /// Blend overlays over the frame in ascending z-order.
    ///
    /// Each overlay is scaled to the frame size first. Layers with equal
    /// z-index keep their capture order.
    pub fn compose(mut frame: RgbaImage, mut overlays: Vec<OverlayLayer>) -> RgbaImage {
        let (width, height) = frame.dimensions();
        overlays.sort_by_key(|layer| layer.z_index);

        for layer in overlays {
            if layer.image.width() == 0 || layer.image.height() == 0 {
                continue;
            }
            let scaled = if layer.image.dimensions() == (width, height) {
                layer.image
            } else {
                imageops::resize(&layer.image, width, height, FilterType::Triangle)
            };
            imageops::overlay(&mut frame, &scaled, 0, 0);
        }
        frame
    }

    /// Encode an image as PNG.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| {
                ViewerError::export_failed(ExportFailureReason::EncodeError, e.to_string())
            })?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_reason_codes() {
        assert_eq!(ExportFailureReason::NoCanvas.to_string(), "no-canvas");
        assert_eq!(ExportFailureReason::NoViewport.to_string(), "no-viewport");
        assert_eq!(ExportFailureReason::EncodeError.to_string(), "encode-error");
        assert_eq!(
            serde_json::to_string(&ExportFailureReason::EncodeError).unwrap(),
            "\"encode-error\""
        );
    }

    #[test]
    fn test_file_names() {
        let name = default_file_name("sensvuer-export");
        assert!(name.starts_with("sensvuer-export-"));
        assert!(name["sensvuer-export-".len()..].parse::<u128>().is_ok());

        let request = ExportRequest::new().file_name("scan");
        assert_eq!(request.file_name_with_extension(), "scan.png");
        let request = ExportRequest::new().file_name("scan.PNG");
        assert_eq!(request.file_name_with_extension(), "scan.PNG");
        let request = ExportRequest::new().file_name("  ");
        assert!(request.file_name_with_extension().starts_with("sensvuer-export-"));
    }

    #[test]
    fn test_compose_respects_z_order() {
        let frame = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let red = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        // Blue has the higher z-index, so it ends up on top
        let composed = ExportCompositor::compose(
            frame,
            vec![OverlayLayer::new(5, blue), OverlayLayer::new(1, red)],
        );
        assert_eq!(*composed.get_pixel(2, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_compose_scales_overlays() {
        let frame = RgbaImage::from_pixel(8, 6, Rgba([0, 0, 0, 255]));
        let small = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));

        let composed = ExportCompositor::compose(frame, vec![OverlayLayer::new(0, small)]);
        assert_eq!(composed.dimensions(), (8, 6));
        assert_eq!(*composed.get_pixel(7, 5), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_transparent_overlay_keeps_frame() {
        let frame = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let clear = RgbaImage::from_pixel(3, 3, Rgba([255, 255, 255, 0]));

        let composed = ExportCompositor::compose(frame, vec![OverlayLayer::new(0, clear)]);
        assert_eq!(*composed.get_pixel(1, 1), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_encode_png_decodes() {
        let image = RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255]));
        let bytes = ExportCompositor::encode_png(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (5, 3));
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_artifact_write() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            file_name: "out.png".to_string(),
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3],
        };
        let path = artifact.write_to(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_artifact_write_stays_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        std::fs::create_dir(&target).unwrap();
        let mut artifact = ExportArtifact {
            file_name: "../escape.png".to_string(),
            width: 1,
            height: 1,
            bytes: vec![7],
        };

        let path = artifact.write_to(&target).unwrap();
        assert_eq!(path, target.join("escape.png"));
        assert!(!dir.path().join("escape.png").exists());

        artifact.file_name = "..".to_string();
        let err = artifact.write_to(&target).unwrap_err();
        assert_eq!(err.export_reason(), Some(ExportFailureReason::EncodeError));
    }
}
