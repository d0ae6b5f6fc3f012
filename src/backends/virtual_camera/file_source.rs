// SPDX-License-Identifier: GPL-3.0-only

//! Still-image sources for the virtual camera
//!
//! A configured image file is handed to the capture callback as-is (JPEG
//! bytes stay encoded, other formats are expanded to RGBA). Without a file the
//! camera produces a generated test pattern.

use crate::backends::camera::types::{BackendError, BackendResult, ImageEncoding, ImageProxy};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tracing::debug;

/// Load a still image file as a captured frame
pub fn load_image_as_frame(path: &Path, rotation_degrees: i32) -> BackendResult<ImageProxy> {
    let bytes = std::fs::read(path)
        .map_err(|e| BackendError::IoError(format!("{}: {}", path.display(), e)))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if extension == "jpg" || extension == "jpeg" {
        let (width, height) = image::ImageReader::new(std::io::Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::IoError(e.to_string()))?
            .into_dimensions()
            .map_err(|e| BackendError::Other(format!("Unreadable JPEG: {}", e)))?;

        debug!(path = %path.display(), width, height, "Loaded JPEG still");
        return Ok(ImageProxy::new(
            width,
            height,
            rotation_degrees,
            ImageEncoding::Jpeg,
            bytes,
        ));
    }

    let rgba = image::load_from_memory(&bytes)
        .map_err(|e| BackendError::Other(format!("Unsupported image: {}", e)))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    debug!(path = %path.display(), width, height, "Loaded still as RGBA");
    Ok(ImageProxy::new(
        width,
        height,
        rotation_degrees,
        ImageEncoding::Rgba8,
        rgba.into_raw(),
    ))
}

/// Intensity at `position` of a 0..=255 ramp spanning `extent`
fn ramp(position: u32, extent: u32) -> u8 {
    (u64::from(position) * 255 / u64::from(extent.max(1))) as u8
}

/// Generate a test pattern frame as a sensor would deliver it
///
/// Horizontal red ramp, vertical green ramp, and a white block in the
/// top-left corner so the applied rotation is visible in the output.
pub fn test_pattern_frame(width: u32, height: u32, rotation_degrees: i32) -> ImageProxy {
    let marker = (width.min(height) / 8).max(1);
    let image = RgbaImage::from_fn(width, height, |x, y| {
        if x < marker && y < marker {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([ramp(x, width), ramp(y, height), 96, 255])
        }
    });

    ImageProxy::new(
        width,
        height,
        rotation_degrees,
        ImageEncoding::Rgba8,
        image.into_raw(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_dimensions_and_marker() {
        let frame = test_pattern_frame(16, 8, 90);
        assert_eq!(frame.width, 16);
        assert_eq!(frame.height, 8);
        assert_eq!(frame.data().len(), 16 * 8 * 4);
        // Marker pixel is white
        assert_eq!(&frame.data()[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_ramp_spans_wide_frames() {
        assert_eq!(ramp(0, 640), 0);
        assert_eq!(ramp(320, 640), 127);
        // 20M * 255 does not fit in a u32
        assert_eq!(ramp(20_000_000, 20_000_001), 254);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_image_as_frame(Path::new("/nonexistent/still.jpg"), 0);
        assert!(matches!(result, Err(BackendError::IoError(_))));
    }
}
