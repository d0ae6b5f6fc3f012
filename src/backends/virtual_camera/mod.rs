// SPDX-License-Identifier: GPL-3.0-only

//! File-backed camera controller
//!
//! Stands in for a hardware camera on machines without one:
//!
//! - Photos come from a configured still image, or a generated test pattern,
//!   tagged with the configured sensor rotation of the selected lens.
//! - Recordings copy a configured source clip into the requested output when
//!   stopped. Without a clip the recording finalizes with an error.
//!
//! Callbacks and listener events are delivered from tasks on the runtime
//! the controller was created with, never inline from the requesting call.

mod file_source;

pub use file_source::{load_image_as_frame, test_pattern_frame};

use crate::backends::camera::{
    ActiveRecording, AudioConfig, BackendError, BackendResult, CameraController, CameraSelector,
    FileOutputOptions, ImageCaptureError, OnImageCapturedCallback, VideoRecordEvent,
    VideoRecordListener,
};
use crate::config::VirtualCameraConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Error code reported when the controller is not bound
const ERROR_CAMERA_CLOSED: i32 = 1;
/// Error code reported when the still source cannot be read
const ERROR_CAPTURE_FAILED: i32 = 2;

/// Virtual camera controller
pub struct VirtualCameraController {
    config: VirtualCameraConfig,
    runtime: Handle,
    bound: AtomicBool,
    selector: Mutex<CameraSelector>,
    recording_active: Arc<AtomicBool>,
}

impl VirtualCameraController {
    /// Create an unbound controller delivering callbacks on `runtime`
    pub fn new(config: VirtualCameraConfig, selector: CameraSelector, runtime: Handle) -> Self {
        Self {
            config,
            runtime,
            bound: AtomicBool::new(false),
            selector: Mutex::new(selector),
            recording_active: Arc::new(AtomicBool::new(false)),
        }
    }

    fn rotation_for(&self, selector: CameraSelector) -> i32 {
        match selector {
            CameraSelector::Back => self.config.back_rotation_degrees,
            CameraSelector::Front => self.config.front_rotation_degrees,
        }
    }
}

impl CameraController for VirtualCameraController {
    fn bind_to_lifecycle(&self) -> BackendResult<()> {
        self.bound.store(true, Ordering::SeqCst);
        info!(selector = %self.camera_selector(), "Virtual camera bound");
        Ok(())
    }

    fn unbind(&self) {
        self.bound.store(false, Ordering::SeqCst);
        info!("Virtual camera unbound");
    }

    fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    fn take_picture(&self, callback: Box<dyn OnImageCapturedCallback>) {
        if !self.is_bound() {
            self.runtime.spawn(async move {
                callback.on_error(ImageCaptureError {
                    code: ERROR_CAMERA_CLOSED,
                    message: BackendError::NotBound.to_string(),
                });
            });
            return;
        }

        let rotation = self.rotation_for(self.camera_selector());
        let source = self.config.photo_source.clone();
        let (width, height) = (self.config.pattern_width, self.config.pattern_height);

        self.runtime.spawn(async move {
            let frame = tokio::task::spawn_blocking(move || match source {
                Some(path) => load_image_as_frame(&path, rotation),
                None => Ok(test_pattern_frame(width, height, rotation)),
            })
            .await
            .map_err(|e| BackendError::Other(e.to_string()))
            .and_then(|result| result);

            match frame {
                Ok(image) => {
                    debug!(?image, "Virtual capture complete");
                    callback.on_capture_success(image);
                }
                Err(e) => callback.on_error(ImageCaptureError {
                    code: ERROR_CAPTURE_FAILED,
                    message: e.to_string(),
                }),
            }
        });
    }

    fn start_recording(
        &self,
        output: FileOutputOptions,
        audio: AudioConfig,
        mut listener: VideoRecordListener,
    ) -> BackendResult<Box<dyn ActiveRecording>> {
        if !self.is_bound() {
            return Err(BackendError::NotBound);
        }
        if self.recording_active.swap(true, Ordering::SeqCst) {
            return Err(BackendError::RecordingInProgress);
        }

        if audio.enabled {
            debug!("Virtual camera has no microphone; audio track comes from the source clip");
        }

        let source = self.config.video_source.clone();
        let active = Arc::clone(&self.recording_active);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        info!(output = %output.path.display(), "Virtual recording started");

        self.runtime.spawn(async move {
            listener(VideoRecordEvent::Start);

            // A dropped handle stops the recording as well
            let _ = stop_rx.await;

            let error = match source {
                Some(source) => match tokio::fs::copy(&source, &output.path).await {
                    Ok(bytes) => {
                        debug!(bytes, "Source clip written to recording output");
                        None
                    }
                    Err(e) => Some(format!("{}: {}", source.display(), e)),
                },
                None => Some("No video source configured for the virtual camera".to_string()),
            };

            if let Some(ref e) = error {
                warn!(error = %e, "Virtual recording finalized with error");
            }

            active.store(false, Ordering::SeqCst);
            listener(VideoRecordEvent::Finalize {
                output: output.path,
                error,
            });
        });

        Ok(Box::new(VirtualRecording {
            stop_tx: Some(stop_tx),
        }))
    }

    fn camera_selector(&self) -> CameraSelector {
        self.selector
            .lock()
            .map(|s| *s)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    fn set_camera_selector(&self, selector: CameraSelector) {
        match self.selector.lock() {
            Ok(mut current) => *current = selector,
            Err(poisoned) => *poisoned.into_inner() = selector,
        }
        info!(%selector, "Camera selector changed");
    }
}

/// Handle for a virtual recording
struct VirtualRecording {
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ActiveRecording for VirtualRecording {
    fn stop(&mut self) -> BackendResult<()> {
        let sender = self
            .stop_tx
            .take()
            .ok_or(BackendError::NoRecordingInProgress)?;
        // The recording task may already be gone if the runtime shut down
        let _ = sender.send(());
        Ok(())
    }
}
