// SPDX-License-Identifier: GPL-3.0-only
// Shared types for the camera controller abstraction

//! Shared types for camera controllers

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which lens the controller is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraSelector {
    /// Rear-facing camera
    #[default]
    Back,
    /// Front-facing (selfie) camera
    Front,
}

impl CameraSelector {
    /// The other lens
    pub fn flipped(self) -> Self {
        match self {
            CameraSelector::Back => CameraSelector::Front,
            CameraSelector::Front => CameraSelector::Back,
        }
    }
}

impl std::fmt::Display for CameraSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSelector::Back => write!(f, "back"),
            CameraSelector::Front => write!(f, "front"),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Phone sensors are commonly mounted at 90° or 270° relative to the
/// display's natural orientation. The controller reports the rotation needed
/// to bring a captured image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (image is already upright)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    ///
    /// Values that are not a multiple of 90 fall back to no rotation.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, SensorRotation::Rotate90 | SensorRotation::Rotate270)
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Encoding of the bytes held by an [`ImageProxy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Tightly packed RGBA, 4 bytes per pixel
    Rgba8,
    /// A complete JPEG bitstream, as most still-capture pipelines deliver
    Jpeg,
}

/// Raw captured image handed to a capture callback
///
/// Owns a platform image buffer. The buffer is released exactly once, either
/// through [`ImageProxy::close`] or when the proxy is dropped, so a callback
/// that is ignored (the waiting capture was cancelled) does not leak it.
pub struct ImageProxy {
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation needed to display the image upright
    pub rotation_degrees: i32,
    pub encoding: ImageEncoding,
    data: Vec<u8>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl ImageProxy {
    pub fn new(
        width: u32,
        height: u32,
        rotation_degrees: i32,
        encoding: ImageEncoding,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            rotation_degrees,
            encoding,
            data,
            on_release: None,
        }
    }

    /// Attach a hook that runs when the underlying buffer is released
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Image bytes in [`ImageProxy::encoding`]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn rotation(&self) -> SensorRotation {
        SensorRotation::from_degrees_int(self.rotation_degrees)
    }

    /// Release the platform buffer
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.data = Vec::new();
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl Drop for ImageProxy {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ImageProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageProxy")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("encoding", &self.encoding)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Error reported by a controller's capture callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCaptureError {
    /// Controller-specific error code
    pub code: i32,
    pub message: String,
}

impl std::fmt::Display for ImageCaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Where a recording is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutputOptions {
    pub path: PathBuf,
}

/// Audio track configuration for a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    pub enabled: bool,
}

impl AudioConfig {
    pub fn create(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Lifecycle events of an active recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRecordEvent {
    /// Recording has begun writing to the output
    Start,
    /// Recording has ended; delivered exactly once per recording
    Finalize {
        output: PathBuf,
        /// Set when the output is incomplete or unusable
        error: Option<String>,
    },
}

/// Result type for controller operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for controller operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Controller is not bound to a lifecycle
    NotBound,
    /// Recording already in progress
    RecordingInProgress,
    /// No recording in progress
    NoRecordingInProgress,
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotBound => write!(f, "Camera is not bound to a lifecycle"),
            BackendError::RecordingInProgress => write!(f, "Recording already in progress"),
            BackendError::NoRecordingInProgress => write!(f, "No recording in progress"),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_rotation_normalisation() {
        assert_eq!(SensorRotation::from_degrees_int(90), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees_int(-90), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(450), SensorRotation::Rotate90);
        assert_eq!(SensorRotation::from_degrees_int(45), SensorRotation::None);
        assert!(SensorRotation::Rotate270.swaps_dimensions());
        assert!(!SensorRotation::Rotate180.swaps_dimensions());
    }

    #[test]
    fn test_image_proxy_released_once() {
        let released = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&released);
        let proxy = ImageProxy::new(2, 2, 0, ImageEncoding::Rgba8, vec![0; 16])
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        proxy.close();
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let counter = Arc::clone(&released);
        let proxy = ImageProxy::new(2, 2, 0, ImageEncoding::Rgba8, vec![0; 16])
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        drop(proxy);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_selector_flip() {
        assert_eq!(CameraSelector::Back.flipped(), CameraSelector::Front);
        assert_eq!(CameraSelector::Front.flipped(), CameraSelector::Back);
    }
}
