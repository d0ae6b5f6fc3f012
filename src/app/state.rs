// SPDX-License-Identifier: GPL-3.0-only

//! UI-facing application state

use crate::backends::camera::{CameraController, CameraSelector};
use crate::errors::{AppError, CaptureError, RecordError};
use crate::permissions::{PermissionStatus, are_permissions_granted};
use crate::pipelines::{CameraRepository, CaptureResult, RecordToggle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Holds the observable UI state and forwards user intents
///
/// Two values are observable through `watch` receivers:
/// - `is_recording`: flipped optimistically on every record toggle
/// - `last_captured_photo`: set after a capture, cleared after the display
///   window
pub struct CameraViewModel<R: CameraRepository> {
    repository: Arc<R>,
    controller: Arc<dyn CameraController>,
    permissions: Arc<dyn PermissionStatus>,
    is_recording: Arc<watch::Sender<bool>>,
    last_captured_photo: Arc<watch::Sender<Option<CaptureResult>>>,
    display_window: Duration,
    gallery_dir: Option<PathBuf>,
}

impl<R: CameraRepository> CameraViewModel<R> {
    pub fn new(
        repository: Arc<R>,
        controller: Arc<dyn CameraController>,
        permissions: Arc<dyn PermissionStatus>,
        display_window: Duration,
    ) -> Self {
        let (is_recording, _) = watch::channel(false);
        let (last_captured_photo, _) = watch::channel(None);
        Self {
            repository,
            controller,
            permissions,
            is_recording: Arc::new(is_recording),
            last_captured_photo: Arc::new(last_captured_photo),
            display_window,
            gallery_dir: None,
        }
    }

    /// Directory opened by [`CameraViewModel::open_gallery`]
    pub fn with_gallery_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.gallery_dir = dir;
        self
    }

    pub fn is_recording(&self) -> watch::Receiver<bool> {
        self.is_recording.subscribe()
    }

    pub fn last_captured_photo(&self) -> watch::Receiver<Option<CaptureResult>> {
        self.last_captured_photo.subscribe()
    }

    pub fn controller(&self) -> &Arc<dyn CameraController> {
        &self.controller
    }

    fn permitted(&self, action: &str) -> bool {
        let granted = are_permissions_granted(self.permissions.as_ref());
        if !granted {
            debug!(action, "Permissions not granted, ignoring request");
        }
        granted
    }

    /// Shutter pressed
    ///
    /// Publishes the capture, then clears it after the display window even if
    /// a newer capture arrived meanwhile. Returns `None` when permissions are
    /// missing.
    pub fn request_photo(&self) -> Option<JoinHandle<Result<(), CaptureError>>> {
        if !self.permitted("photo") {
            return None;
        }

        let repository = Arc::clone(&self.repository);
        let controller = Arc::clone(&self.controller);
        let last_captured_photo = Arc::clone(&self.last_captured_photo);
        let display_window = self.display_window;

        Some(tokio::spawn(async move {
            let photo = repository
                .take_photo(controller.as_ref())
                .await
                .inspect_err(|e| error!(error = %e, "Photo capture failed"))?;

            last_captured_photo.send_replace(Some(photo));
            tokio::time::sleep(display_window).await;
            last_captured_photo.send_replace(None);
            Ok(())
        }))
    }

    /// Record button pressed
    ///
    /// `is_recording` flips immediately; the toggle itself runs
    /// independently. Returns `None` when permissions are missing.
    pub fn request_record_toggle(
        &self,
    ) -> Option<JoinHandle<Result<RecordToggle, RecordError>>> {
        if !self.permitted("record") {
            return None;
        }

        self.is_recording.send_modify(|recording| *recording = !*recording);

        let repository = Arc::clone(&self.repository);
        let controller = Arc::clone(&self.controller);

        Some(tokio::spawn(async move {
            repository
                .record_video(controller.as_ref())
                .await
                .inspect(|toggle| debug!(?toggle, "Record toggle done"))
                .inspect_err(|e| error!(error = %e, "Record toggle failed"))
        }))
    }

    /// Camera switch pressed; returns the newly selected lens
    pub fn flip_camera(&self) -> CameraSelector {
        let selector = self.controller.camera_selector().flipped();
        self.controller.set_camera_selector(selector);
        selector
    }

    /// Gallery button pressed: open the media directory in the system viewer
    pub fn open_gallery(&self) -> Result<(), AppError> {
        let dir = self
            .gallery_dir
            .as_ref()
            .ok_or_else(|| AppError::Other("No gallery location available".into()))?;
        info!(path = %dir.display(), "Opening gallery");
        open::that(dir).map_err(|e| AppError::Other(format!("Failed to open gallery: {}", e)))
    }
}
