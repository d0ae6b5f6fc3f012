// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! Controller callback → Decode → Orientation fix → CaptureResult
//!                                                   ├─▶ caller (UI preview)
//!                                                   └─▶ persistence (blocking pool)
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Capture**: request a still and await the one-shot callback
//! 2. **Processing**: decode to RGBA and rotate upright, releasing the raw image
//! 3. **Encoding**: JPEG at maximum quality, streamed into the media library

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::capture_image;
pub use encoding::encode_jpeg;
pub use processing::{develop, normalize_orientation};

use crate::backends::camera::types::SensorRotation;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use std::sync::Arc;

/// A decoded, upright still
///
/// Cloning shares the pixel buffer.
#[derive(Clone)]
pub struct CaptureResult {
    image: Arc<RgbaImage>,
    orientation: SensorRotation,
    captured_at: DateTime<Utc>,
}

impl CaptureResult {
    /// Wrap an image that has already been rotated upright
    pub fn upright(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
            orientation: SensorRotation::None,
            captured_at: Utc::now(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Remaining rotation needed for display; always none
    pub fn orientation(&self) -> SensorRotation {
        self.orientation
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

impl std::fmt::Debug for CaptureResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureResult")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("orientation", &self.orientation)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
