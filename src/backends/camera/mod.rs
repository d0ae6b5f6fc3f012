// SPDX-License-Identifier: MPL-2.0

//! Camera controller abstraction
//!
//! The orchestration layer never touches a camera device directly. It talks to
//! a lifecycle-bound controller that owns the device and reports results
//! through callbacks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CameraViewModel    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CaptureOrchestrator │  ← callback → future bridging, recording slot
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraController    │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!            ▼
//!   ┌────────────────┐
//!   │ VirtualCamera  │  ← File-backed implementation
//!   └────────────────┘
//! ```

pub mod types;

pub use types::*;

/// Receives the outcome of a single `take_picture` request
///
/// A well-behaved controller invokes exactly one of the two methods, once.
/// Implementations must tolerate being invoked after the requester has gone
/// away.
pub trait OnImageCapturedCallback: Send + 'static {
    /// The capture succeeded; ownership of the image moves to the callback
    fn on_capture_success(&self, image: ImageProxy);

    /// The capture failed
    fn on_error(&self, error: ImageCaptureError);
}

/// Listener for the events of one recording
pub type VideoRecordListener = Box<dyn FnMut(VideoRecordEvent) + Send + 'static>;

/// Handle to an in-progress recording
pub trait ActiveRecording: Send {
    /// Request the recording to stop
    ///
    /// Returns once the request is accepted; the listener later receives
    /// [`VideoRecordEvent::Finalize`] when the output is complete.
    fn stop(&mut self) -> BackendResult<()>;
}

/// Lifecycle-bound camera controller
///
/// Methods take `&self` so a single controller can be shared between the UI
/// layer and the orchestrator behind an `Arc`.
pub trait CameraController: Send + Sync {
    /// Bind the camera to the application lifecycle (opens the device)
    fn bind_to_lifecycle(&self) -> BackendResult<()>;

    /// Release the device
    fn unbind(&self);

    /// Whether the controller is currently bound
    fn is_bound(&self) -> bool;

    /// Capture a single still image; the result is delivered to `callback`
    fn take_picture(&self, callback: Box<dyn OnImageCapturedCallback>);

    /// Start recording audio and video to `output`
    fn start_recording(
        &self,
        output: FileOutputOptions,
        audio: AudioConfig,
        listener: VideoRecordListener,
    ) -> BackendResult<Box<dyn ActiveRecording>>;

    /// Currently selected lens
    fn camera_selector(&self) -> CameraSelector;

    /// Switch lens; takes effect for subsequent captures
    fn set_camera_selector(&self, selector: CameraSelector);
}
